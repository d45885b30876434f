use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:5000")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite connection string
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Cap on jobs executing at once. Unset means unbounded.
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,

    /// Directory export packages are written under
    #[serde(default = "default_export_base_path")]
    pub export_base_path: String,

    /// Public URL prefix for export packages, if they are served
    #[serde(default)]
    pub export_url_prefix: Option<String>,

    /// Fabric API base URL
    pub fabric_api_url: String,

    /// Fabric API key, sent as the `apiKey` header
    pub fabric_api_key: String,

    #[serde(default = "default_fabric_api_timeout_secs")]
    pub fabric_api_timeout_secs: u64,

    /// Upper bound for `limit` on list requests
    #[serde(default = "default_list_limit_max")]
    pub list_limit_max: usize,

    /// Age after which the reconcile pass fails a `Running` job
    #[serde(default = "default_stale_running_after_secs")]
    pub stale_running_after_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_database_url() -> String {
    "sqlite://spark_jobs.db".to_string()
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_export_base_path() -> String {
    "exports".to_string()
}

fn default_fabric_api_timeout_secs() -> u64 {
    30
}

fn default_list_limit_max() -> usize {
    1000
}

fn default_stale_running_after_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn fabric_api_timeout(&self) -> Duration {
        Duration::from_secs(self.fabric_api_timeout_secs)
    }

    /// Age after which the reconcile pass treats a `Running` job as stale.
    /// Values too large to represent saturate to `chrono::Duration::MAX`.
    pub fn stale_running_after(&self) -> chrono::Duration {
        i64::try_from(self.stale_running_after_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
