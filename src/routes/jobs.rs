//! Handlers shared by the export and import endpoints. Both kinds live in
//! one store; every lookup checks the kind so an export id never resolves
//! under `/imports` and vice versa.

use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::{CreateJobResponse, JobListResponse, ListJobsParams};
use crate::models::job::{JobKind, JobRecord};
use crate::models::work_order::WorkOrder;
use crate::routes::error::ApiError;
use crate::services::store::JobQuery;

/// Persist the job, hand it to the scheduler and answer before it runs.
pub(crate) async fn accept(
    state: &AppState,
    order: WorkOrder,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let job = state.engine.create_job(order).await?;

    // Outcome is read back through the status endpoint.
    drop(state.scheduler.schedule(job.job_id));

    Ok((StatusCode::ACCEPTED, Json(CreateJobResponse::from(&job))))
}

pub(crate) async fn fetch(state: &AppState, kind: JobKind, job_id: Uuid) -> Result<JobRecord, ApiError> {
    let job = state.engine.get_job(job_id).await?;
    if job.kind != kind {
        return Err(ApiError::WrongKind(job_id));
    }
    Ok(job)
}

pub(crate) async fn list(
    state: &AppState,
    kind: JobKind,
    params: ListJobsParams,
) -> Result<Json<JobListResponse>, ApiError> {
    let jobs = state
        .engine
        .list_jobs(JobQuery {
            repo_guid: params.repo_guid,
            kind: Some(kind),
            limit: params.limit.unwrap_or(0),
        })
        .await?;

    Ok(Json(JobListResponse {
        total: jobs.len(),
        jobs,
    }))
}
