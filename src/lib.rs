//! Spark export/import job service
//!
//! Accepts export work orders (pull metadata from Fabric, write an export
//! package) and import work orders (push LLM highlights to Fabric), runs
//! them in the background, and tracks each job through
//! `Pending -> Running -> Succeeded | Failed` in a durable store.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;

use sqlx::SqlitePool;
use std::sync::Arc;

use config::AppConfig;
use db::SqliteJobStore;
use services::{
    adapters::RemoteError, artifacts::PackageGenerator, engine::JobEngine, fabric::FabricClient,
};

/// Wire the engine to the SQLite store, the Fabric client and the package
/// generator described by `config`.
pub fn build_engine(config: &AppConfig, pool: SqlitePool) -> Result<JobEngine, RemoteError> {
    let remote = FabricClient::new(
        &config.fabric_api_url,
        &config.fabric_api_key,
        config.fabric_api_timeout(),
    )?;
    let generator = PackageGenerator::new(&config.export_base_path, config.export_url_prefix.clone());

    Ok(JobEngine::new(
        Arc::new(SqliteJobStore::new(pool)),
        Arc::new(generator),
        Arc::new(remote),
        config.list_limit_max,
    ))
}
