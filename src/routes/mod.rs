pub mod error;
pub mod exports;
pub mod health;
pub mod imports;
mod jobs;
pub mod metrics;

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Build the HTTP application. `/metrics` is only mounted when a Prometheus
/// recorder was installed.
pub fn router(state: AppState, prometheus: Option<Arc<PrometheusHandle>>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/exports",
            get(exports::list_exports).post(exports::create_export),
        )
        .route("/api/v1/exports/{job_id}", get(exports::get_export))
        .route("/api/v1/exports/{job_id}/status", get(exports::get_export_status))
        .route(
            "/api/v1/imports",
            get(imports::list_imports).post(imports::create_import),
        )
        .route("/api/v1/imports/{job_id}", get(imports::get_import))
        .route("/api/v1/imports/{job_id}/status", get(imports::get_import_status))
        .with_state(state);

    if let Some(handle) = prometheus {
        app = app.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(handle),
        );
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}
