//! Export package generator.
//!
//! Each export job gets its own directory under the configured base path.
//! Files are written in full before the reference is returned; a failure on
//! any file fails the whole generation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::artifact::{ArtifactEntry, ArtifactReference, ExportData, SegmentCategory};
use crate::models::work_order::{ExportWorkOrder, OutputFormats, IMPORT_SCHEMA_VERSION};
use crate::services::adapters::{ArtifactGenerator, GenerationError};
use crate::services::render;

const GROUNDING_FILE: &str = "grounding_prompt.txt";
const INSTRUCTIONS_FILE: &str = "llm_instructions.md";
const MANIFEST_FILE: &str = "manifest.json";

const CATEGORIES: [SegmentCategory; 3] = [
    SegmentCategory::Transcript,
    SegmentCategory::Events,
    SegmentCategory::Comments,
];

pub struct PackageGenerator {
    base_path: PathBuf,
    url_prefix: Option<String>,
}

impl PackageGenerator {
    pub fn new(base_path: impl Into<PathBuf>, url_prefix: Option<String>) -> Self {
        Self {
            base_path: base_path.into(),
            url_prefix,
        }
    }

    async fn write(
        dir: &Path,
        artifact_type: &str,
        format: &str,
        filename: String,
        contents: &[u8],
    ) -> Result<ArtifactEntry, GenerationError> {
        let path = dir.join(&filename);
        let shown = path.display().to_string();
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| GenerationError::Io {
                path: shown.clone(),
                source,
            })?;

        tracing::debug!(path = %shown, bytes = contents.len(), "Wrote export artifact");
        Ok(ArtifactEntry::new(artifact_type, format, filename, shown, contents.len() as u64))
    }
}

fn requested(order: &ExportWorkOrder, category: SegmentCategory) -> Option<&OutputFormats> {
    let outputs = &order.outputs;
    match category {
        SegmentCategory::Transcript => outputs.transcript.as_ref(),
        SegmentCategory::Events => outputs.events.as_ref(),
        SegmentCategory::Comments => outputs.comments.as_ref(),
    }
}

fn grounding_prompt(order: &ExportWorkOrder) -> String {
    let mut text = format!(
        "Repository: {}\nExport preset: {}\nExport mode: {}\n",
        order.repo_guid, order.metadata.export_preset, order.metadata.export_mode
    );
    if let Some(prompt) = order.user_inputs.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
        text.push_str("\nContext from the requester:\n");
        text.push_str(prompt.trim());
        text.push('\n');
    }
    text
}

fn llm_instructions() -> String {
    format!(
        "# Working with this export\n\
         \n\
         The files in this package are time-coded metadata for a single asset:\n\
         \n\
         - `transcript.*`: spoken dialogue or narration\n\
         - `events.*`: detected events (labels, OCR, topics, speakers)\n\
         - `comments.*`: reviewer comments\n\
         - `{GROUNDING_FILE}`: context describing what the asset is\n\
         \n\
         ## Rules\n\
         \n\
         - Use only the files in this package. Do not invent facts.\n\
         - Cite evidence with timestamps (start and end in seconds) and segment ids.\n\
         - Say so when the data is ambiguous.\n\
         \n\
         ## Returning highlights\n\
         \n\
         When asked for an import package, reply with JSON only:\n\
         \n\
         ```json\n\
         {{\n  \"schemaVersion\": \"{IMPORT_SCHEMA_VERSION}\",\n  \"asset\": {{\"repo_guid\": \"...\", \"fullPath\": \"...\"}},\n  \"highlights\": [\n    {{\"insight\": \"...\", \"start\": 0.0, \"end\": 1.0, \"confidenceScore\": 80, \"eventMeta\": {{\"associatedEventIds\": []}}}}\n  ]\n}}\n\
         ```\n\
         \n\
         Every highlight needs `end` greater than `start` and a confidence above 0.\n"
    )
}

#[async_trait]
impl ArtifactGenerator for PackageGenerator {
    async fn generate_artifact(
        &self,
        job_id: Uuid,
        order: &ExportWorkOrder,
        data: &ExportData,
    ) -> Result<ArtifactReference, GenerationError> {
        let dir = self.base_path.join(job_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| GenerationError::Io {
                path: dir.display().to_string(),
                source,
            })?;

        let mut artifacts = Vec::new();

        for category in CATEGORIES {
            let Some(outputs) = requested(order, category) else {
                continue;
            };
            let segments = data.get(category).unwrap_or_default();
            let segments = if outputs.is_single_segment {
                render::collapse(segments)
            } else {
                segments.to_vec()
            };

            let name = category.to_string();
            for format in &outputs.formats {
                let body = render::render(*format, &name, &segments)?;
                let filename = format!("{name}.{format}");
                artifacts.push(
                    Self::write(&dir, &name, &format.to_string(), filename, body.as_bytes()).await?,
                );
            }
        }

        if order.outputs.selects.enabled {
            let comments = data.get(SegmentCategory::Comments).unwrap_or_default();
            for format in &order.outputs.selects.formats {
                let body = render::render(*format, "Selects", comments)?;
                let filename = format!("selects.{format}");
                artifacts.push(
                    Self::write(&dir, "selects", &format.to_string(), filename, body.as_bytes()).await?,
                );
            }
        }

        if order.outputs.grounding.enabled {
            let body = grounding_prompt(order);
            artifacts.push(
                Self::write(&dir, "grounding", "txt", GROUNDING_FILE.to_string(), body.as_bytes()).await?,
            );
        }

        if order.user_inputs.llm_instructions {
            let body = llm_instructions();
            artifacts.push(
                Self::write(&dir, "llm_instructions", "md", INSTRUCTIONS_FILE.to_string(), body.as_bytes())
                    .await?,
            );
        }

        let manifest = json!({
            "job_id": job_id,
            "repo_guid": order.repo_guid,
            "spark_version": order.spark_version,
            "export_preset": order.metadata.export_preset,
            "export_mode": order.metadata.export_mode,
            "requested_by": order.metadata.requested_by,
            "generated_at": Utc::now(),
            "artifacts": artifacts,
        });
        let body = serde_json::to_vec_pretty(&manifest)?;
        artifacts.push(Self::write(&dir, "manifest", "json", MANIFEST_FILE.to_string(), &body).await?);

        let url = self
            .url_prefix
            .as_deref()
            .map(|prefix| format!("{}/{}", prefix.trim_end_matches('/'), job_id));

        tracing::info!(
            job_id = %job_id,
            location = %dir.display(),
            files = artifacts.len(),
            "Export package generated"
        );

        Ok(ArtifactReference {
            location: dir.display().to_string(),
            url,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::Segment;
    use crate::models::work_order::tests::export_order;
    use crate::models::work_order::ArtifactFormat;

    fn segment(id: &str, start: f64, end: f64) -> Segment {
        Segment {
            id: id.to_string(),
            event_type: "comment".to_string(),
            value: format!("note {id}"),
            start,
            end,
            confidence_score: None,
            full_path: None,
        }
    }

    #[tokio::test]
    async fn writes_requested_files_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let generator = PackageGenerator::new(dir.path(), Some("https://files.example/exports/".to_string()));

        let mut order = export_order("r1");
        order.user_inputs.prompt = Some("Interview with the director".to_string());
        order.outputs.transcript = Some(OutputFormats {
            formats: vec![ArtifactFormat::Srt, ArtifactFormat::Json],
            is_single_segment: false,
        });
        order.outputs.selects.enabled = true;

        let mut data = ExportData::default();
        data.set(SegmentCategory::Transcript, vec![segment("t1", 0.0, 1.0)]);
        data.set(SegmentCategory::Comments, vec![segment("c1", 2.0, 4.0)]);

        let job_id = Uuid::new_v4();
        let reference = generator.generate_artifact(job_id, &order, &data).await.unwrap();

        let names: Vec<&str> = reference.artifacts.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "transcript.srt",
                "transcript.json",
                "selects.edl",
                GROUNDING_FILE,
                INSTRUCTIONS_FILE,
                MANIFEST_FILE
            ]
        );
        assert_eq!(reference.url.as_deref(), Some(format!("https://files.example/exports/{job_id}").as_str()));

        let job_dir = dir.path().join(job_id.to_string());
        let srt = std::fs::read_to_string(job_dir.join("transcript.srt")).unwrap();
        assert!(srt.contains("note t1"));
        let grounding = std::fs::read_to_string(job_dir.join(GROUNDING_FILE)).unwrap();
        assert!(grounding.contains("Interview with the director"));

        let manifest: serde_json::Value =
            serde_json::from_slice(&std::fs::read(job_dir.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest["repo_guid"], "r1");
        assert_eq!(manifest["artifacts"].as_array().unwrap().len(), 5);

        for artifact in &reference.artifacts {
            let size = std::fs::metadata(&artifact.path).unwrap().len();
            assert_eq!(size, artifact.file_size, "{}", artifact.filename);
        }
    }

    #[tokio::test]
    async fn single_segment_collapses_category() {
        let dir = tempfile::tempdir().unwrap();
        let generator = PackageGenerator::new(dir.path(), None);

        let mut order = export_order("r1");
        order.user_inputs.llm_instructions = false;
        order.outputs.grounding.enabled = false;
        order.outputs.events = Some(OutputFormats {
            formats: vec![ArtifactFormat::Json],
            is_single_segment: true,
        });
        let mut data = ExportData::default();
        data.set(SegmentCategory::Events, vec![segment("e1", 0.0, 1.0), segment("e2", 5.0, 9.0)]);

        let job_id = Uuid::new_v4();
        let reference = generator.generate_artifact(job_id, &order, &data).await.unwrap();
        assert!(reference.url.is_none());
        assert_eq!(reference.artifacts.len(), 2);

        let body = std::fs::read_to_string(dir.path().join(job_id.to_string()).join("events.json")).unwrap();
        let events: Vec<Segment> = serde_json::from_str(&body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].start, events[0].end), (0.0, 9.0));
    }

    #[tokio::test]
    async fn unwritable_base_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let generator = PackageGenerator::new(&blocker, None);
        let err = generator
            .generate_artifact(Uuid::new_v4(), &export_order("r1"), &ExportData::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Io { .. }));
    }
}
