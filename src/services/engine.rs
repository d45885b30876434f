//! Job lifecycle engine: creates jobs, drives them through the state
//! machine, and answers status queries.
//!
//! Creation and execution are separate calls. `create_job`
//! only persists a `Pending` record; whoever accepted the request hands the
//! id to a scheduler, which later calls `execute`. Every transition is
//! written to the store before the next step begins.

use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::api::JobStatusResponse;
use crate::models::artifact::{ExportData, SegmentCategory};
use crate::models::job::{
    FailureKind, JobEvent, JobFailure, JobRecord, JobResult, JobState, TransitionError,
};
use crate::models::work_order::{ExportWorkOrder, WorkOrder};
use crate::services::adapters::{ArtifactGenerator, RemoteClient};
use crate::services::store::{JobQuery, JobStore, StateCounts, StoreError};
use crate::services::validation::{validate_work_order, ValidationErrors};

/// Default page size when a list request names none.
pub const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Invalid work order: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Invalid transition for job {job_id}: {source}")]
    InvalidTransition {
        job_id: Uuid,
        #[source]
        source: TransitionError,
    },

    #[error("Job not found: {0}")]
    NotFound(Uuid),
}

/// What `execute` did with a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// The job ran and ended in this terminal state.
    Completed(JobState),
    /// The job was not pending (or another writer moved it first); nothing
    /// was changed. Carries the state observed at that moment.
    Skipped(JobState),
}

pub struct JobEngine {
    store: Arc<dyn JobStore>,
    generator: Arc<dyn ArtifactGenerator>,
    remote: Arc<dyn RemoteClient>,
    list_limit_max: usize,
}

impl JobEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        generator: Arc<dyn ArtifactGenerator>,
        remote: Arc<dyn RemoteClient>,
        list_limit_max: usize,
    ) -> Self {
        Self {
            store,
            generator,
            remote,
            list_limit_max: list_limit_max.max(1),
        }
    }

    /// Validate and persist a new `Pending` job. Does not start it.
    pub async fn create_job(&self, order: WorkOrder) -> Result<JobRecord, JobError> {
        let kind = order.kind();

        if let Err(errors) = validate_work_order(&order) {
            warn!(kind = %kind, error = %errors, "Rejected work order");
            return Err(errors.into());
        }

        let job = JobRecord::new(order, Utc::now());

        if let Err(e) = self.store.insert(&job).await {
            error!(job_id = %job.job_id, kind = %kind, error = %e, "Failed to persist new job");
            return Err(e.into());
        }

        counter!("jobs_created_total", "kind" => kind.as_str()).increment(1);
        info!(
            job_id = %job.job_id,
            kind = %kind,
            repo_guid = %job.repo_guid,
            "Job created"
        );

        Ok(job)
    }

    /// Run a pending job to completion.
    ///
    /// Adapter failures are captured on the job as `Failed`, not returned.
    /// An `Err` means the store could not be read or written, in which case
    /// the job keeps whatever state was last persisted.
    pub async fn execute(&self, job_id: Uuid) -> Result<Execution, JobError> {
        let mut job = self.get_job(job_id).await?;

        if job.state != JobState::Pending {
            warn!(job_id = %job_id, state = %job.state, "Job is not pending, skipping execution");
            counter!("jobs_skipped_total").increment(1);
            return Ok(Execution::Skipped(job.state));
        }

        if !self.transition(&mut job, JobEvent::Start).await? {
            return self.skipped(job_id).await;
        }

        let kind = job.kind;
        let started = Instant::now();

        let event = match self.run(&job).await {
            Ok(result) => JobEvent::Succeed(result),
            Err(failure) => {
                error!(
                    job_id = %job_id,
                    kind = %kind,
                    reason = %failure.kind,
                    error = %failure.message,
                    "Job execution failed"
                );
                JobEvent::Fail(failure)
            }
        };

        if !self.transition(&mut job, event).await? {
            warn!(job_id = %job_id, "Job left running state while executing, result discarded");
            return self.skipped(job_id).await;
        }

        histogram!("job_execution_seconds", "kind" => kind.as_str())
            .record(started.elapsed().as_secs_f64());
        match &job.error {
            None => counter!("jobs_succeeded_total", "kind" => kind.as_str()).increment(1),
            Some(failure) => counter!(
                "jobs_failed_total",
                "kind" => kind.as_str(),
                "reason" => failure.kind.to_string()
            )
            .increment(1),
        }

        Ok(Execution::Completed(job.state))
    }

    /// Current state of a job plus its outcome once terminal.
    pub async fn get_status(&self, job_id: Uuid) -> Result<JobStatusResponse, JobError> {
        Ok(self.get_job(job_id).await?.into())
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<JobRecord, JobError> {
        self.store
            .get(job_id)
            .await?
            .ok_or(JobError::NotFound(job_id))
    }

    /// Jobs matching `query`, newest first. A zero limit means the default;
    /// any limit is capped at the configured maximum.
    pub async fn list_jobs(&self, mut query: JobQuery) -> Result<Vec<JobRecord>, JobError> {
        if query.limit == 0 {
            query.limit = DEFAULT_LIST_LIMIT;
        }
        query.limit = query.limit.min(self.list_limit_max);
        Ok(self.store.list(&query).await?)
    }

    pub async fn state_counts(&self) -> Result<StateCounts, JobError> {
        Ok(self.store.state_counts().await?)
    }

    pub async fn store_reachable(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Job store unreachable");
                false
            }
        }
    }

    /// Mark jobs that have sat in `Running` longer than `older_than` as
    /// `Failed(Timeout)`. Never called by the server itself; this is the
    /// external reconciliation pass for jobs orphaned by a crash.
    pub async fn fail_stale_running(&self, older_than: chrono::Duration) -> Result<Vec<Uuid>, JobError> {
        let Some(cutoff) = Utc::now().checked_sub_signed(older_than) else {
            info!(
                older_than_secs = older_than.num_seconds(),
                "Stale cutoff predates any timestamp; nothing to reconcile"
            );
            return Ok(Vec::new());
        };
        let stale = self
            .store
            .list_stale(JobState::Running, cutoff, self.list_limit_max)
            .await?;

        let mut reconciled = Vec::new();
        for mut job in stale {
            let failure = JobFailure::new(
                FailureKind::Timeout,
                format!("job was running since {} with no progress", job.updated_at),
            );
            if self.transition(&mut job, JobEvent::Fail(failure)).await? {
                counter!("jobs_reconciled_total").increment(1);
                reconciled.push(job.job_id);
            }
        }

        Ok(reconciled)
    }

    /// Apply `event` and persist the full record, guarded by the state it was
    /// read in. Returns `false` if the stored job moved on in the meantime.
    async fn transition(&self, job: &mut JobRecord, event: JobEvent) -> Result<bool, JobError> {
        let event_kind = event.kind();
        let previous = job.apply(event, Utc::now()).map_err(|source| {
            error!(job_id = %job.job_id, state = %job.state, event = %event_kind, "Rejected state transition");
            JobError::InvalidTransition {
                job_id: job.job_id,
                source,
            }
        })?;

        if !self.store.replace(job, previous).await? {
            warn!(job_id = %job.job_id, expected = %previous, "Stored job changed concurrently, transition not applied");
            return Ok(false);
        }

        info!(job_id = %job.job_id, from = %previous, to = %job.state, "Job transitioned");
        Ok(true)
    }

    async fn skipped(&self, job_id: Uuid) -> Result<Execution, JobError> {
        counter!("jobs_skipped_total").increment(1);
        Ok(Execution::Skipped(self.get_job(job_id).await?.state))
    }

    /// Call the collaborators for the job's kind. Single attempt.
    async fn run(&self, job: &JobRecord) -> Result<JobResult, JobFailure> {
        match &job.work_order {
            WorkOrder::Export(order) => {
                let data = self.pull_export_data(order).await?;
                let reference = self
                    .generator
                    .generate_artifact(job.job_id, order, &data)
                    .await
                    .map_err(|e| JobFailure::new(FailureKind::GenerationError, e.to_string()))?;
                Ok(JobResult::Artifact(reference))
            }
            WorkOrder::Import(order) => {
                let summary = self
                    .remote
                    .ingest_highlights(&order.asset, &order.highlights)
                    .await
                    .map_err(|e| JobFailure::new(FailureKind::RemoteError, e.to_string()))?;
                Ok(JobResult::Import(summary))
            }
        }
    }

    async fn pull_export_data(&self, order: &ExportWorkOrder) -> Result<ExportData, JobFailure> {
        let outputs = &order.outputs;
        let mut wanted = Vec::new();
        if outputs.transcript.is_some() {
            wanted.push(SegmentCategory::Transcript);
        }
        if outputs.events.is_some() {
            wanted.push(SegmentCategory::Events);
        }
        if outputs.comments.is_some() || outputs.selects.enabled {
            wanted.push(SegmentCategory::Comments);
        }

        let mut data = ExportData::default();
        for category in wanted {
            let segments = self
                .remote
                .fetch_segments(&order.repo_guid, category, &order.inputs.event_ids)
                .await
                .map_err(|e| JobFailure::new(FailureKind::RemoteError, e.to_string()))?;
            data.set(category, segments);
        }
        Ok(data)
    }
}
