use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::{CreateJobResponse, JobListResponse, JobStatusResponse, ListJobsParams};
use crate::models::job::{JobKind, JobRecord};
use crate::models::work_order::{ImportWorkOrder, WorkOrder};
use crate::routes::error::ApiError;
use crate::routes::jobs;

/// POST /api/v1/imports: accept a highlight import package.
pub async fn create_import(
    State(state): State<AppState>,
    payload: Result<Json<ImportWorkOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let Json(order) = payload?;
    jobs::accept(&state, WorkOrder::Import(order)).await
}

pub async fn get_import(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, ApiError> {
    Ok(Json(jobs::fetch(&state, JobKind::Import, job_id).await?))
}

pub async fn get_import_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let job = jobs::fetch(&state, JobKind::Import, job_id).await?;
    Ok(Json(job.into()))
}

pub async fn list_imports(
    State(state): State<AppState>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<JobListResponse>, ApiError> {
    jobs::list(&state, JobKind::Import, params).await
}
