use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{JobFailure, JobKind, JobRecord, JobResult, JobState};

/// Response after accepting a job.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
}

impl From<&JobRecord> for CreateJobResponse {
    fn from(job: &JobRecord) -> Self {
        Self {
            job_id: job.job_id,
            kind: job.kind,
            state: job.state,
            created_at: job.created_at,
        }
    }
}

/// Current state of a job, with its outcome once terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(job: JobRecord) -> Self {
        Self {
            job_id: job.job_id,
            kind: job.kind,
            state: job.state,
            result: job.result,
            error: job.error,
            created_at: job.created_at,
            updated_at: job.updated_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// Query string for list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    pub repo_guid: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponse {
    pub total: usize,
    pub jobs: Vec<JobRecord>,
}
