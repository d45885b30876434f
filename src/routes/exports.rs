use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::{CreateJobResponse, JobListResponse, JobStatusResponse, ListJobsParams};
use crate::models::job::{JobKind, JobRecord};
use crate::models::work_order::{ExportWorkOrder, WorkOrder};
use crate::routes::error::ApiError;
use crate::routes::jobs;

/// POST /api/v1/exports: accept an export work order.
pub async fn create_export(
    State(state): State<AppState>,
    payload: Result<Json<ExportWorkOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let Json(order) = payload?;
    jobs::accept(&state, WorkOrder::Export(order)).await
}

/// GET /api/v1/exports/{job_id}
pub async fn get_export(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, ApiError> {
    Ok(Json(jobs::fetch(&state, JobKind::Export, job_id).await?))
}

/// GET /api/v1/exports/{job_id}/status
pub async fn get_export_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let job = jobs::fetch(&state, JobKind::Export, job_id).await?;
    Ok(Json(job.into()))
}

/// GET /api/v1/exports?repo_guid=&limit=
pub async fn list_exports(
    State(state): State<AppState>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<JobListResponse>, ApiError> {
    jobs::list(&state, JobKind::Export, params).await
}
