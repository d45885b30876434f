use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::job::JobKind;

/// Schema version accepted for highlight imports.
pub const IMPORT_SCHEMA_VERSION: &str = "sdna.spark.import.v1";

/// The validated input payload of a job. The variant decides which
/// collaborator the engine calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WorkOrder {
    Export(ExportWorkOrder),
    Import(ImportWorkOrder),
}

impl WorkOrder {
    pub fn kind(&self) -> JobKind {
        match self {
            WorkOrder::Export(_) => JobKind::Export,
            WorkOrder::Import(_) => JobKind::Import,
        }
    }
}

/// Output file format for exported segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactFormat {
    Json,
    Csv,
    Srt,
    Vtt,
    Edl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Editorial,
    Llm,
    Review,
    Promo,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExportWorkOrder {
    #[serde(default = "default_spark_version")]
    #[garde(length(min = 1, max = 16))]
    pub spark_version: String,

    #[garde(length(min = 1, max = 255))]
    pub repo_guid: String,

    #[serde(default)]
    #[garde(dive)]
    pub inputs: ExportInputs,

    #[serde(default)]
    #[garde(dive)]
    pub user_inputs: UserInputs,

    #[serde(default)]
    #[garde(dive)]
    pub outputs: ExportOutputs,

    #[serde(default)]
    #[garde(dive)]
    pub metadata: ExportMetadata,
}

fn default_spark_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExportInputs {
    #[serde(default)]
    #[garde(inner(length(min = 1)))]
    pub event_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserInputs {
    #[serde(default)]
    #[garde(length(max = 10_000))]
    pub prompt: Option<String>,

    #[serde(default = "default_true")]
    #[garde(skip)]
    pub llm_instructions: bool,
}

impl Default for UserInputs {
    fn default() -> Self {
        Self {
            prompt: None,
            llm_instructions: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Formats requested for one category of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OutputFormats {
    #[garde(length(min = 1))]
    pub formats: Vec<ArtifactFormat>,

    /// Collapse every segment of the category into a single one.
    #[serde(rename = "isSingleSegment", default)]
    #[garde(skip)]
    pub is_single_segment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SelectsConfig {
    #[serde(default)]
    #[garde(skip)]
    pub enabled: bool,

    #[serde(default = "default_selects_formats")]
    #[garde(length(min = 1))]
    pub formats: Vec<ArtifactFormat>,
}

impl Default for SelectsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            formats: default_selects_formats(),
        }
    }
}

fn default_selects_formats() -> Vec<ArtifactFormat> {
    vec![ArtifactFormat::Edl]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GroundingConfig {
    #[serde(default = "default_true")]
    #[garde(skip)]
    pub enabled: bool,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExportOutputs {
    #[serde(default)]
    #[garde(dive)]
    pub transcript: Option<OutputFormats>,

    #[serde(default)]
    #[garde(dive)]
    pub events: Option<OutputFormats>,

    #[serde(default)]
    #[garde(dive)]
    pub comments: Option<OutputFormats>,

    #[serde(default)]
    #[garde(dive)]
    pub selects: SelectsConfig,

    #[serde(default)]
    #[garde(dive)]
    pub grounding: GroundingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExportMetadata {
    #[serde(default)]
    #[garde(length(max = 255))]
    pub requested_by: Option<String>,

    #[serde(default = "default_export_preset")]
    #[garde(length(min = 1, max = 64))]
    pub export_preset: String,

    #[serde(default)]
    #[garde(skip)]
    pub export_mode: ExportMode,
}

impl Default for ExportMetadata {
    fn default() -> Self {
        Self {
            requested_by: None,
            export_preset: default_export_preset(),
            export_mode: ExportMode::default(),
        }
    }
}

fn default_export_preset() -> String {
    "editorial".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ImportWorkOrder {
    #[serde(rename = "schemaVersion")]
    #[garde(custom(check_schema_version))]
    pub schema_version: String,

    #[garde(dive)]
    pub asset: Asset,

    #[garde(length(min = 1), dive)]
    pub highlights: Vec<Highlight>,
}

fn check_schema_version(value: &String, _ctx: &()) -> garde::Result {
    if value == IMPORT_SCHEMA_VERSION {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "unsupported schema version, expected {IMPORT_SCHEMA_VERSION}"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Asset {
    #[garde(length(min = 1, max = 255))]
    pub repo_guid: String,

    #[serde(rename = "fullPath")]
    #[garde(length(min = 1))]
    pub full_path: String,
}

/// A single LLM-produced insight over a time range of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Highlight {
    #[garde(length(min = 1))]
    pub insight: String,

    #[garde(range(min = 0.0))]
    pub start: f64,

    #[garde(skip)]
    pub end: f64,

    #[serde(rename = "confidenceScore", default)]
    #[garde(range(min = 0.0, max = 100.0))]
    pub confidence_score: Option<f64>,

    #[serde(rename = "eventMeta", default)]
    #[garde(skip)]
    pub event_meta: EventMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventMeta {
    #[serde(rename = "associatedEventIds", default)]
    pub associated_event_ids: Option<Vec<String>>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn export_order(repo_guid: &str) -> ExportWorkOrder {
        ExportWorkOrder {
            spark_version: default_spark_version(),
            repo_guid: repo_guid.to_string(),
            inputs: ExportInputs::default(),
            user_inputs: UserInputs::default(),
            outputs: ExportOutputs::default(),
            metadata: ExportMetadata::default(),
        }
    }

    pub(crate) fn import_order() -> ImportWorkOrder {
        ImportWorkOrder {
            schema_version: IMPORT_SCHEMA_VERSION.to_string(),
            asset: Asset {
                repo_guid: "r1".to_string(),
                full_path: "/media/clip.mov".to_string(),
            },
            highlights: vec![Highlight {
                insight: "speaker laughs".to_string(),
                start: 1.0,
                end: 2.5,
                confidence_score: Some(87.0),
                event_meta: EventMeta::default(),
            }],
        }
    }

    #[test]
    fn export_defaults_fill_missing_sections() {
        let order: ExportWorkOrder = serde_json::from_str(r#"{"repo_guid": "r1"}"#).unwrap();

        assert_eq!(order.spark_version, "1.0");
        assert!(order.user_inputs.llm_instructions);
        assert!(order.outputs.grounding.enabled);
        assert!(!order.outputs.selects.enabled);
        assert_eq!(order.outputs.selects.formats, vec![ArtifactFormat::Edl]);
        assert_eq!(order.metadata.export_mode, ExportMode::Editorial);
        assert!(order.validate().is_ok());
    }

    #[test]
    fn empty_repo_guid_is_rejected() {
        let order = export_order("");
        assert!(order.validate().is_err());
    }

    #[test]
    fn import_rejects_unknown_fields() {
        let raw = r#"{
            "schemaVersion": "sdna.spark.import.v1",
            "asset": {"repo_guid": "r1", "fullPath": "/a.mov"},
            "highlights": [],
            "extra": true
        }"#;
        assert!(serde_json::from_str::<ImportWorkOrder>(raw).is_err());
    }

    #[test]
    fn import_schema_version_and_highlights_are_checked() {
        let mut order = import_order();
        order.schema_version = "v0".to_string();
        order.highlights.clear();

        let report = order.validate().unwrap_err();
        let paths: Vec<String> = report.iter().map(|(path, _)| path.to_string()).collect();
        assert!(paths.iter().any(|p| p.contains("schema")));
        assert!(paths.iter().any(|p| p.contains("highlights")));
    }

    #[test]
    fn work_order_round_trips_with_its_tag() {
        let order = WorkOrder::Import(import_order());
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["type"], "import");
        assert_eq!(serde_json::from_value::<WorkOrder>(value).unwrap(), order);
    }
}
