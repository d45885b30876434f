use serde::{Deserialize, Serialize};

/// Segment category pulled from Fabric for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SegmentCategory {
    Transcript,
    Events,
    Comments,
}

/// A timed piece of metadata attached to an asset (transcript line,
/// detected event, reviewer comment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    #[serde(rename = "sdnaEventType", default)]
    pub event_type: String,
    #[serde(rename = "eventValue", default)]
    pub value: String,
    pub start: f64,
    pub end: f64,
    #[serde(rename = "confidenceScore", default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(rename = "fullPath", default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
}

/// Segments fetched for an export, by category. `None` means the category
/// was not requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportData {
    pub transcript: Option<Vec<Segment>>,
    pub events: Option<Vec<Segment>>,
    pub comments: Option<Vec<Segment>>,
}

impl ExportData {
    pub fn get(&self, category: SegmentCategory) -> Option<&[Segment]> {
        match category {
            SegmentCategory::Transcript => self.transcript.as_deref(),
            SegmentCategory::Events => self.events.as_deref(),
            SegmentCategory::Comments => self.comments.as_deref(),
        }
    }

    pub fn set(&mut self, category: SegmentCategory, segments: Vec<Segment>) {
        let slot = match category {
            SegmentCategory::Transcript => &mut self.transcript,
            SegmentCategory::Events => &mut self.events,
            SegmentCategory::Comments => &mut self.comments,
        };
        *slot = Some(segments);
    }
}

/// One file of a generated export package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub artifact_type: String,
    pub format: String,
    pub filename: String,
    pub path: String,
    pub file_size: u64,
}

/// Where a generated export package lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactEntry {
    pub fn new(artifact_type: &str, format: &str, filename: String, path: String, file_size: u64) -> Self {
        Self {
            artifact_type: artifact_type.to_string(),
            format: format.to_string(),
            filename,
            path,
            file_size,
        }
    }
}

/// Confirmation returned by Fabric after a highlight import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub items_processed: u64,
    pub items_created: u64,
    pub items_skipped: u64,
    pub batches: u32,
}
