use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Prometheus scrape endpoint, text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

/// Register descriptions for the job metrics.
pub fn describe() {
    metrics::describe_counter!("jobs_created_total", "Jobs accepted, by kind");
    metrics::describe_counter!("jobs_succeeded_total", "Jobs that reached Succeeded, by kind");
    metrics::describe_counter!("jobs_failed_total", "Jobs that reached Failed, by kind and reason");
    metrics::describe_counter!("jobs_skipped_total", "Execute calls on jobs that were not pending");
    metrics::describe_counter!("jobs_reconciled_total", "Stale running jobs failed by the reconcile pass");
    metrics::describe_gauge!("jobs_in_flight", "Jobs scheduled in this process and not yet finished");
    metrics::describe_histogram!("job_execution_seconds", "Time from Running to a terminal state");
}
