//! TOML batch files.
//!
//! A batch file names its plan in `[plan]` and lists operations as
//! `[[operations]]` tables tagged by `op`:
//!
//! ```toml
//! [plan]
//! title = "Organic chemistry"
//! owner = "registrar"          # optional
//! id = "…"                     # written back once the plan exists
//!
//! [[operations]]
//! op = "create"
//! starts_at = "2026-10-14T09:00:00Z"
//! ends_at = "2026-10-14T10:00:00Z"
//! resource = "Lab B"
//!
//! [[operations]]
//! op = "transition_status"
//! schedule_id = "…"
//! status = "in_progress"
//! ```
//!
//! Timestamps are quoted RFC 3339 strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::BatchOperation;
use crate::entities::schedule::parse_status;

#[derive(Debug, Error)]
pub enum BatchFileError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("operation {index} ({op}): {message}")]
    InvalidOperation {
        index: usize,
        op: &'static str,
        message: String,
    },

    #[error("batch file has no [plan] id; create the plan first")]
    MissingPlanId,
}

/// Top-level structure of a batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
    pub plan: PlanSection,
    #[serde(default)]
    pub operations: Vec<BatchOperation>,
}

/// The `[plan]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSection {
    /// Absent in authored files, present once the plan has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub title: String,
    /// Falls back to the caller's owner when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl BatchFile {
    pub fn plan_id(&self) -> Result<Uuid, BatchFileError> {
        self.plan.id.ok_or(BatchFileError::MissingPlanId)
    }
}

/// Parse a batch file, rejecting unrecognized status values up front.
///
/// Everything else (windows, slot conflicts, unknown schedule ids,
/// transition legality) is checked per item when the batch is applied.
pub fn parse_batch_file(content: &str) -> Result<BatchFile, BatchFileError> {
    let file: BatchFile = toml::from_str(content)?;
    for (index, op) in file.operations.iter().enumerate() {
        check_operation(op).map_err(|message| BatchFileError::InvalidOperation {
            index,
            op: op.name(),
            message,
        })?;
    }
    Ok(file)
}

fn check_operation(op: &BatchOperation) -> Result<(), String> {
    match op {
        BatchOperation::Create(draft) => match draft.status.as_deref() {
            Some(status) => parse_status(status).map(|_| ()).map_err(|e| e.to_string()),
            None => Ok(()),
        },
        BatchOperation::TransitionStatus { status, .. } => {
            parse_status(status).map(|_| ()).map_err(|e| e.to_string())
        }
        BatchOperation::Update(_) | BatchOperation::Delete { .. } => Ok(()),
    }
}
