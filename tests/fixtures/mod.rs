//! Work order payloads used across tests.

#![allow(dead_code)]

use serde_json::{json, Value};

use spark_jobs::models::work_order::{ExportWorkOrder, ImportWorkOrder, WorkOrder};

/// Export request asking for an SRT transcript and event CSV.
pub fn export_payload(repo_guid: &str) -> Value {
    json!({
        "spark_version": "1.0",
        "repo_guid": repo_guid,
        "inputs": {"event_ids": ["evt-1", "evt-2"]},
        "user_inputs": {"prompt": "Panel discussion, keep the jokes"},
        "outputs": {
            "transcript": {"formats": ["srt", "json"], "isSingleSegment": false},
            "events": {"formats": ["csv"]}
        },
        "metadata": {"requested_by": "editor@example.com", "export_mode": "editorial"}
    })
}

pub fn import_payload(repo_guid: &str) -> Value {
    json!({
        "schemaVersion": "sdna.spark.import.v1",
        "asset": {"repo_guid": repo_guid, "fullPath": "/media/day1/interview.mov"},
        "highlights": [
            {
                "insight": "Guest tells the origin story",
                "start": 12.0,
                "end": 48.5,
                "confidenceScore": 91,
                "eventMeta": {"associatedEventIds": ["evt-1"]}
            },
            {"insight": "Audience laughs", "start": 60.0, "end": 64.0}
        ]
    })
}

pub fn export_order(repo_guid: &str) -> WorkOrder {
    let order: ExportWorkOrder = serde_json::from_value(export_payload(repo_guid)).unwrap();
    WorkOrder::Export(order)
}

pub fn import_order(repo_guid: &str) -> WorkOrder {
    let order: ImportWorkOrder = serde_json::from_value(import_payload(repo_guid)).unwrap();
    WorkOrder::Import(order)
}
