//! Test helper utilities: stub collaborators and engine/app builders.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tower::ServiceExt;
use uuid::Uuid;

use spark_jobs::{
    db::{self, SqliteJobStore},
    models::{
        artifact::{ArtifactReference, ExportData, IngestSummary, Segment, SegmentCategory},
        job::JobRecord,
        work_order::{Asset, ExportWorkOrder, Highlight},
    },
    services::{
        adapters::{ArtifactGenerator, GenerationError, RemoteClient, RemoteError},
        engine::JobEngine,
        store::{JobStore, MemoryJobStore},
    },
};

/// How the stub remote answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemoteBehavior {
    #[default]
    Succeed,
    Fail,
    /// Never returns.
    Hang,
}

/// Fabric stand-in that records how many calls overlap.
#[derive(Default)]
pub struct StubRemote {
    pub behavior: RemoteBehavior,
    pub delay: Duration,
    pub calls: AtomicUsize,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl StubRemote {
    pub fn new(behavior: RemoteBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    /// Highest number of calls seen in progress at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn call(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if self.behavior == RemoteBehavior::Hang {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.current.fetch_sub(1, Ordering::SeqCst);
        match self.behavior {
            RemoteBehavior::Fail => Err(RemoteError::Status {
                status: 503,
                body: "fabric unavailable".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteClient for StubRemote {
    async fn fetch_segments(
        &self,
        repo_guid: &str,
        category: SegmentCategory,
        _event_ids: &[String],
    ) -> Result<Vec<Segment>, RemoteError> {
        self.call().await?;
        Ok(vec![Segment {
            id: format!("{repo_guid}-{category}-1"),
            event_type: category.to_string(),
            value: "sample".to_string(),
            start: 0.0,
            end: 1.0,
            confidence_score: None,
            full_path: None,
        }])
    }

    async fn ingest_highlights(
        &self,
        _asset: &Asset,
        highlights: &[Highlight],
    ) -> Result<IngestSummary, RemoteError> {
        self.call().await?;
        Ok(IngestSummary {
            items_processed: highlights.len() as u64,
            items_created: highlights.len() as u64,
            items_skipped: 0,
            batches: 1,
        })
    }
}

/// Generator that records nothing on disk.
pub struct StubGenerator;

#[async_trait]
impl ArtifactGenerator for StubGenerator {
    async fn generate_artifact(
        &self,
        job_id: Uuid,
        _order: &ExportWorkOrder,
        _data: &ExportData,
    ) -> Result<ArtifactReference, GenerationError> {
        Ok(ArtifactReference {
            location: format!("exports/{job_id}"),
            url: None,
            artifacts: Vec::new(),
        })
    }
}

pub fn engine_with_store(store: Arc<dyn JobStore>, remote: Arc<StubRemote>) -> Arc<JobEngine> {
    Arc::new(JobEngine::new(store, Arc::new(StubGenerator), remote, 1000))
}

pub fn memory_engine(remote: Arc<StubRemote>) -> Arc<JobEngine> {
    engine_with_store(Arc::new(MemoryJobStore::new()), remote)
}

/// Migrated in-memory SQLite pool. A single connection that never closes,
/// since each connection would otherwise get its own empty database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn sqlite_engine(remote: Arc<StubRemote>) -> Arc<JobEngine> {
    let store = SqliteJobStore::new(memory_pool().await);
    engine_with_store(Arc::new(store), remote)
}

/// Poll until the job reaches a terminal state.
pub async fn wait_for_terminal(engine: &JobEngine, job_id: Uuid) -> JobRecord {
    for _ in 0..200 {
        let job = engine.get_job(job_id).await.expect("job should exist");
        if job.state.is_terminal() {
            return job;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not finish in time");
}

/// Send a request through the router and decode the JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}
