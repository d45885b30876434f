use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use spark_jobs::{app_state::AppState, config::AppConfig, db, routes};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing spark-jobs server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe();

    tracing::info!(database_url = %config.database_url, "Connecting to SQLite database");
    let db_pool = db::init_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let engine = spark_jobs::build_engine(&config, db_pool).expect("Failed to initialize Fabric client");

    // Pending or Running jobs left by a previous process are not resumed.
    let state = AppState::new(Arc::new(engine), config.max_concurrent_jobs);
    match state.engine.state_counts().await {
        Ok(counts) if counts.pending + counts.running > 0 => tracing::warn!(
            pending = counts.pending,
            running = counts.running,
            "Unfinished jobs from a previous run will not be resumed"
        ),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Could not count stored jobs"),
    }

    let app = routes::router(state, Some(prometheus_handle));

    tracing::info!(
        max_concurrent_jobs = ?config.max_concurrent_jobs,
        export_base_path = %config.export_base_path,
        "Starting spark-jobs on {}",
        config.bind_addr
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
