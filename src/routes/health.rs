use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;
use crate::services::store::StateCounts;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
    pub jobs: JobsHealth,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

#[derive(Serialize)]
pub struct JobsHealth {
    /// Jobs this process has scheduled and not yet finished.
    pub in_flight: usize,
    pub max_concurrency: Option<usize>,
    /// Stored counts; absent when the store could not be read.
    pub counts: Option<StateCounts>,
    /// Stored `Running` jobs this process is not executing. Non-zero after
    /// a crash or restart: those jobs will not finish on their own.
    pub untracked_running: Option<u64>,
}

/// GET /health: store reachability plus job bookkeeping.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();

    let reachable = state.engine.store_reachable().await;
    let database = if reachable {
        ComponentHealth {
            status: "ok".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        }
    } else {
        ComponentHealth {
            status: "error".to_string(),
            latency_ms: None,
        }
    };

    let in_flight = state.scheduler.in_flight();
    let counts = if reachable {
        state.engine.state_counts().await.ok()
    } else {
        None
    };
    let untracked_running = counts.map(|c| c.running.saturating_sub(in_flight as u64));

    let status_code = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if reachable { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database },
        jobs: JobsHealth {
            in_flight,
            max_concurrency: state.scheduler.max_concurrency(),
            counts,
            untracked_running,
        },
    };

    (status_code, Json(response))
}
