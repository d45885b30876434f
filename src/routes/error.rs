use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::engine::JobError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Malformed request body: {0}")]
    Body(#[from] JsonRejection),

    /// The id exists but belongs to the other job kind.
    #[error("Job not found: {0}")]
    WrongKind(Uuid),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::Job(JobError::Validation(_)) | ApiError::Body(_) => {
                (StatusCode::BAD_REQUEST, "ValidationError")
            }
            ApiError::Job(JobError::NotFound(_)) | ApiError::WrongKind(_) => {
                (StatusCode::NOT_FOUND, "NotFound")
            }
            ApiError::Job(JobError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "InvalidTransition")
            }
            ApiError::Job(JobError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PersistenceError")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut body = json!({
            "error": error_type,
            "message": self.to_string(),
        });
        if let ApiError::Job(JobError::Validation(errors)) = &self {
            body["violations"] = json!(errors.violations);
        }

        (status, Json(body)).into_response()
    }
}
