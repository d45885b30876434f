use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::job::{JobKind, JobRecord, JobState};

/// Filter for listing jobs. Results are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub repo_guid: Option<String>,
    pub kind: Option<JobKind>,
    pub limit: usize,
}

/// Number of stored jobs per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StateCounts {
    pub pending: u64,
    pub running: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl StateCounts {
    pub fn add(&mut self, state: JobState, n: u64) {
        match state {
            JobState::Pending => self.pending += n,
            JobState::Running => self.running += n,
            JobState::Succeeded => self.succeeded += n,
            JobState::Failed => self.failed += n,
        }
    }
}

/// Durable persistence of job documents keyed by `job_id`.
///
/// Writes always carry the whole record so a reader sees either the old or
/// the new document, never a mix.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::Duplicate`] if the id exists.
    async fn insert(&self, job: &JobRecord) -> Result<(), StoreError>;

    async fn get(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError>;

    /// Replace the stored record only if it is still in `expected` state.
    /// Returns `false` when another writer got there first.
    async fn replace(&self, job: &JobRecord, expected: JobState) -> Result<bool, StoreError>;

    async fn list(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError>;

    /// Jobs in `state` whose last update is older than `before`, oldest first.
    async fn list_stale(
        &self,
        state: JobState,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JobRecord>, StoreError>;

    async fn state_counts(&self) -> Result<StateCounts, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Job {0} already exists")]
    Duplicate(Uuid),
}

/// Process-local store. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, (u64, JobRecord)>>,
    seq: AtomicU64,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.job_id) {
            return Err(StoreError::Duplicate(job.job_id));
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        jobs.insert(job.job_id, (seq, job.clone()));
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.read().await.get(&job_id).map(|(_, job)| job.clone()))
    }

    async fn replace(&self, job: &JobRecord, expected: JobState) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.job_id) {
            Some((_, stored)) if stored.state == expected => {
                *stored = job.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<&(u64, JobRecord)> = jobs
            .values()
            .filter(|(_, job)| {
                query
                    .repo_guid
                    .as_ref()
                    .map_or(true, |guid| job.repo_guid == *guid)
                    && query.kind.map_or(true, |kind| job.kind == kind)
            })
            .collect();

        matching.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        Ok(matching
            .into_iter()
            .take(query.limit)
            .map(|(_, job)| job.clone())
            .collect())
    }

    async fn list_stale(
        &self,
        state: JobState,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut stale: Vec<JobRecord> = jobs
            .values()
            .filter(|(_, job)| job.state == state && job.updated_at < before)
            .map(|(_, job)| job.clone())
            .collect();
        stale.sort_by_key(|job| job.updated_at);
        stale.truncate(limit);
        Ok(stale)
    }

    async fn state_counts(&self) -> Result<StateCounts, StoreError> {
        let mut counts = StateCounts::default();
        for (_, job) in self.jobs.read().await.values() {
            counts.add(job.state, 1);
        }
        Ok(counts)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobEvent;
    use crate::models::work_order::tests::{export_order, import_order};
    use crate::models::work_order::WorkOrder;

    fn export_job(repo_guid: &str, at: DateTime<Utc>) -> JobRecord {
        JobRecord::new(WorkOrder::Export(export_order(repo_guid)), at)
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryJobStore::new();
        let job = export_job("r1", Utc::now());

        store.insert(&job).await.unwrap();
        let err = store.insert(&job).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(id) if id == job.job_id));
    }

    #[tokio::test]
    async fn replace_is_guarded_by_expected_state() {
        let store = MemoryJobStore::new();
        let mut job = export_job("r1", Utc::now());
        store.insert(&job).await.unwrap();

        job.apply(JobEvent::Start, Utc::now()).unwrap();
        assert!(store.replace(&job, JobState::Pending).await.unwrap());
        assert!(!store.replace(&job, JobState::Pending).await.unwrap());

        let stored = store.get(job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Running);
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let store = MemoryJobStore::new();
        let base = Utc::now();

        let old = export_job("r1", base);
        let new = export_job("r1", base + chrono::Duration::seconds(5));
        let other = export_job("r2", base + chrono::Duration::seconds(10));
        let import = JobRecord::new(WorkOrder::Import(import_order()), base);
        for job in [&old, &new, &other, &import] {
            store.insert(job).await.unwrap();
        }

        let query = JobQuery {
            repo_guid: Some("r1".to_string()),
            limit: 10,
            ..Default::default()
        };
        let ids: Vec<Uuid> = store.list(&query).await.unwrap().iter().map(|j| j.job_id).collect();
        assert_eq!(ids, vec![new.job_id, old.job_id]);

        let imports = store
            .list(&JobQuery {
                kind: Some(JobKind::Import),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(imports.len(), 1);

        let capped = store
            .list(&JobQuery {
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn counts_and_stale_lookup_follow_state() {
        let store = MemoryJobStore::new();
        let long_ago = Utc::now() - chrono::Duration::hours(2);

        let mut running = export_job("r1", long_ago);
        running.apply(JobEvent::Start, long_ago).unwrap();
        store.insert(&running).await.unwrap();
        store.insert(&export_job("r1", Utc::now())).await.unwrap();

        let counts = store.state_counts().await.unwrap();
        assert_eq!((counts.pending, counts.running), (1, 1));

        let cutoff = Utc::now() - chrono::Duration::hours(1);
        let stale = store.list_stale(JobState::Running, cutoff, 10).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].job_id, running.job_id);
    }
}
