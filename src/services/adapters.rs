//! Collaborators invoked while a job executes. The engine treats them as
//! black boxes: one attempt, whatever error they report is final.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::artifact::{ArtifactReference, ExportData, IngestSummary, Segment, SegmentCategory};
use crate::models::work_order::{Asset, ExportWorkOrder, Highlight};

/// Turns an export work order plus the data pulled for it into a package on
/// durable storage.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    async fn generate_artifact(
        &self,
        job_id: Uuid,
        order: &ExportWorkOrder,
        data: &ExportData,
    ) -> Result<ArtifactReference, GenerationError>;
}

/// Transfers data to and from the Fabric platform.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Pull the segments of one category for a repository.
    async fn fetch_segments(
        &self,
        repo_guid: &str,
        category: SegmentCategory,
        event_ids: &[String],
    ) -> Result<Vec<Segment>, RemoteError>;

    /// Push imported highlights for an asset.
    async fn ingest_highlights(
        &self,
        asset: &Asset,
        highlights: &[Highlight],
    ) -> Result<IngestSummary, RemoteError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fabric returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A later ingest batch failed after earlier ones were accepted. Fabric
    /// keeps what it already received.
    #[error("ingest stopped after {batches_pushed} batches ({items_pushed} highlights accepted): {source}")]
    PartialIngest {
        batches_pushed: u32,
        items_pushed: u64,
        #[source]
        source: Box<RemoteError>,
    },
}
