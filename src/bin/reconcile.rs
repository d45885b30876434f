//! One-shot reconciliation pass: fails jobs that have been `Running` for
//! longer than `STALE_RUNNING_AFTER_SECS`. Run it by hand or from cron,
//! never alongside a server that may still be executing those jobs.

use tracing_subscriber::EnvFilter;

use spark_jobs::{config::AppConfig, db};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    tracing::info!(database_url = %config.database_url, "Connecting to SQLite database");
    let db_pool = db::init_pool(&config.database_url, 1)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let engine = spark_jobs::build_engine(&config, db_pool).expect("Failed to initialize Fabric client");

    let older_than = config.stale_running_after();
    match engine.fail_stale_running(older_than).await {
        Ok(ids) => {
            for id in &ids {
                tracing::info!(job_id = %id, "Marked stale job as failed");
            }
            tracing::info!(
                reconciled = ids.len(),
                older_than_secs = config.stale_running_after_secs,
                "Reconcile pass finished"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Reconcile pass failed");
            std::process::exit(1);
        }
    }
}
