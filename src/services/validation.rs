use garde::Validate;
use serde::Serialize;
use std::fmt;

use crate::models::work_order::{ArtifactFormat, ExportWorkOrder, ImportWorkOrder, WorkOrder};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every reason a work order was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a work order before it is accepted.
///
/// Field constraints come from the `garde` attributes on the work order
/// types; rules spanning several fields are checked here.
pub fn validate_work_order(order: &WorkOrder) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();

    let report = match order {
        WorkOrder::Export(export) => export.validate(),
        WorkOrder::Import(import) => import.validate(),
    };
    if let Err(report) = report {
        for (path, error) in report.iter() {
            violations.push(FieldViolation {
                field: path.to_string(),
                message: error.message().to_string(),
            });
        }
    }

    match order {
        WorkOrder::Export(export) => check_export_rules(export, &mut violations),
        WorkOrder::Import(import) => check_import_rules(import, &mut violations),
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { violations })
    }
}

fn check_export_rules(order: &ExportWorkOrder, violations: &mut Vec<FieldViolation>) {
    if let Some(transcript) = &order.outputs.transcript {
        if transcript.formats.contains(&ArtifactFormat::Edl) {
            violations.push(FieldViolation {
                field: "outputs.transcript.formats".to_string(),
                message: "edl is not allowed for transcript".to_string(),
            });
        }
    }

    if order.outputs.selects.enabled
        && order
            .outputs
            .selects
            .formats
            .iter()
            .any(|f| *f != ArtifactFormat::Edl)
    {
        violations.push(FieldViolation {
            field: "outputs.selects.formats".to_string(),
            message: "selects only support edl".to_string(),
        });
    }
}

fn check_import_rules(order: &ImportWorkOrder, violations: &mut Vec<FieldViolation>) {
    for (i, highlight) in order.highlights.iter().enumerate() {
        if highlight.end <= highlight.start {
            violations.push(FieldViolation {
                field: format!("highlights[{i}]"),
                message: "end must be greater than start".to_string(),
            });
        }
        if highlight.confidence_score == Some(0.0) {
            violations.push(FieldViolation {
                field: format!("highlights[{i}].confidenceScore"),
                message: "confidence must be > 0 for LLM highlights".to_string(),
            });
        }
    }
}
