use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::artifact::{ArtifactReference, IngestSummary};
use crate::models::work_order::WorkOrder;

/// Which flavor of job a record tracks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    Export,
    Import,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Export => "export",
            JobKind::Import => "import",
        }
    }
}

/// Lifecycle state of a job. Transitions only move forward:
/// `Pending -> Running -> (Succeeded | Failed)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// The transition table. Every state change in the crate goes through here.
    pub fn next(self, event: EventKind) -> Result<JobState, TransitionError> {
        match (self, event) {
            (JobState::Pending, EventKind::Start) => Ok(JobState::Running),
            (JobState::Running, EventKind::Succeed) => Ok(JobState::Succeeded),
            (JobState::Running, EventKind::Fail) => Ok(JobState::Failed),
            (from, event) => Err(TransitionError { from, event }),
        }
    }
}

/// Payload-free discriminant of a [`JobEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EventKind {
    Start,
    Succeed,
    Fail,
}

/// An event applied to a job record.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Start,
    Succeed(JobResult),
    Fail(JobFailure),
}

impl JobEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            JobEvent::Start => EventKind::Start,
            JobEvent::Succeed(_) => EventKind::Succeed,
            JobEvent::Fail(_) => EventKind::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event} to a job in state {from}")]
pub struct TransitionError {
    pub from: JobState,
    pub event: EventKind,
}

/// Category of an execution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum FailureKind {
    GenerationError,
    RemoteError,
    /// Only produced by the external stale-job sweep.
    Timeout,
}

/// Structured failure reason persisted on a failed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome persisted on a succeeded job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobResult {
    Artifact(ArtifactReference),
    Import(IngestSummary),
}

/// A durable job document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub state: JobState,
    pub work_order: WorkOrder,
    /// Repository the job concerns; the export's target or the import's asset.
    pub repo_guid: String,
    pub result: Option<JobResult>,
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// A fresh `Pending` record with a newly generated identifier.
    pub fn new(work_order: WorkOrder, now: DateTime<Utc>) -> Self {
        let repo_guid = match &work_order {
            WorkOrder::Export(order) => order.repo_guid.clone(),
            WorkOrder::Import(order) => order.asset.repo_guid.clone(),
        };

        Self {
            job_id: Uuid::new_v4(),
            kind: work_order.kind(),
            state: JobState::Pending,
            work_order,
            repo_guid,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Apply `event`, returning the state the record was in before.
    /// On rejection the record is left untouched.
    pub fn apply(&mut self, event: JobEvent, now: DateTime<Utc>) -> Result<JobState, TransitionError> {
        let previous = self.state;
        let next = previous.next(event.kind())?;

        match event {
            JobEvent::Start => self.started_at = Some(now),
            JobEvent::Succeed(result) => {
                self.result = Some(result);
                self.completed_at = Some(now);
            }
            JobEvent::Fail(failure) => {
                self.error = Some(failure);
                self.completed_at = Some(now);
            }
        }

        self.state = next;
        self.updated_at = now;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::work_order::tests::{export_order, import_order};

    #[test]
    fn transition_table_only_allows_forward_moves() {
        use EventKind::*;
        use JobState::*;

        assert_eq!(Pending.next(Start), Ok(Running));
        assert_eq!(Running.next(Succeed), Ok(Succeeded));
        assert_eq!(Running.next(Fail), Ok(Failed));

        for (from, event) in [
            (Pending, Succeed),
            (Pending, Fail),
            (Running, Start),
            (Succeeded, Start),
            (Succeeded, Succeed),
            (Succeeded, Fail),
            (Failed, Start),
            (Failed, Succeed),
            (Failed, Fail),
        ] {
            assert_eq!(from.next(event), Err(TransitionError { from, event }));
        }
    }

    #[test]
    fn new_export_record_is_pending_with_repo_guid() {
        let record = JobRecord::new(WorkOrder::Export(export_order("r1")), Utc::now());
        assert_eq!(record.state, JobState::Pending);
        assert_eq!(record.kind, JobKind::Export);
        assert_eq!(record.repo_guid, "r1");
        assert!(record.result.is_none() && record.error.is_none());
    }

    #[test]
    fn import_record_takes_repo_guid_from_asset() {
        let record = JobRecord::new(WorkOrder::Import(import_order()), Utc::now());
        assert_eq!(record.kind, JobKind::Import);
        assert_eq!(record.repo_guid, "r1");
    }

    #[test]
    fn failure_sets_error_and_timestamps() {
        let created = Utc::now();
        let mut record = JobRecord::new(WorkOrder::Import(import_order()), created);

        let started = created + chrono::Duration::seconds(1);
        record.apply(JobEvent::Start, started).unwrap();
        assert_eq!(record.started_at, Some(started));

        let done = started + chrono::Duration::seconds(1);
        let failure = JobFailure::new(FailureKind::RemoteError, "boom");
        assert_eq!(record.apply(JobEvent::Fail(failure.clone()), done), Ok(JobState::Running));

        assert_eq!(record.state, JobState::Failed);
        assert_eq!(record.error, Some(failure));
        assert!(record.result.is_none());
        assert_eq!(record.updated_at, done);
        assert_eq!(record.completed_at, Some(done));
    }

    #[test]
    fn rejected_event_leaves_record_unchanged() {
        let mut record = JobRecord::new(WorkOrder::Export(export_order("r1")), Utc::now());
        let before = record.clone();

        let err = record
            .apply(JobEvent::Succeed(JobResult::Import(IngestSummary::default())), Utc::now())
            .unwrap_err();

        assert_eq!(err.from, JobState::Pending);
        assert_eq!(err.event, EventKind::Succeed);
        assert_eq!(record, before);
    }

    #[test]
    fn failure_kind_serializes_by_variant_name() {
        let failure = JobFailure::new(FailureKind::RemoteError, "x");
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["kind"], "RemoteError");
    }
}
