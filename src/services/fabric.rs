use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::artifact::{IngestSummary, Segment, SegmentCategory};
use crate::models::work_order::{Asset, Highlight};
use crate::services::adapters::{RemoteClient, RemoteError};

/// Highlights sent per ingest request.
const INGEST_BATCH_SIZE: usize = 500;

const EVENTS_PATH: &str = "/catalogs/aiEnrichedMetadata/events";
const INGEST_PATH: &str = "/catalogs/aiEnrichedMetadata/insights/llm/add";

/// Client for the Fabric metadata API.
pub struct FabricClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SegmentsResponse {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestRequest<'a> {
    repo_guid: &'a str,
    full_path: &'a str,
    file_name: &'a str,
    insight_events: &'a [Highlight],
}

impl FabricClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn push_batch(&self, url: &str, body: &IngestRequest<'_>) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(url)
            .header("apiKey", &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for FabricClient {
    async fn fetch_segments(
        &self,
        repo_guid: &str,
        category: SegmentCategory,
        event_ids: &[String],
    ) -> Result<Vec<Segment>, RemoteError> {
        let url = format!("{}{}", self.base_url, EVENTS_PATH);
        let category = category.to_string();

        let mut query = vec![("repoGuid", repo_guid.to_string()), ("category", category.clone())];
        if !event_ids.is_empty() {
            query.push(("eventIds", event_ids.join(",")));
        }

        let response = self
            .http
            .get(&url)
            .header("apiKey", &self.api_key)
            .query(&query)
            .send()
            .await?;

        let mut segments = Self::check(response).await?.json::<SegmentsResponse>().await?.segments;
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));

        tracing::info!(
            repo_guid = %repo_guid,
            category = %category,
            count = segments.len(),
            "Fetched segments from Fabric"
        );

        Ok(segments)
    }

    async fn ingest_highlights(
        &self,
        asset: &Asset,
        highlights: &[Highlight],
    ) -> Result<IngestSummary, RemoteError> {
        let url = format!("{}{}", self.base_url, INGEST_PATH);
        let file_name = asset.full_path.rsplit('/').next().unwrap_or_default();

        let mut summary = IngestSummary::default();
        for batch in highlights.chunks(INGEST_BATCH_SIZE) {
            let body = IngestRequest {
                repo_guid: &asset.repo_guid,
                full_path: &asset.full_path,
                file_name,
                insight_events: batch,
            };

            if let Err(e) = self.push_batch(&url, &body).await {
                if summary.batches == 0 {
                    return Err(e);
                }
                tracing::warn!(
                    repo_guid = %asset.repo_guid,
                    batches = summary.batches,
                    accepted = summary.items_created,
                    error = %e,
                    "Highlight ingest failed partway"
                );
                return Err(RemoteError::PartialIngest {
                    batches_pushed: summary.batches,
                    items_pushed: summary.items_created,
                    source: Box::new(e),
                });
            }

            summary.batches += 1;
            summary.items_created += batch.len() as u64;
            summary.items_processed += batch.len() as u64;
        }

        tracing::info!(
            repo_guid = %asset.repo_guid,
            created = summary.items_created,
            batches = summary.batches,
            "Highlights ingested into Fabric"
        );

        Ok(summary)
    }
}
