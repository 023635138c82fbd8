//! Batch schedule operations and their per-item results.
//!
//! A batch is applied best-effort: each operation commits or fails on its
//! own, and the result reports every item in input order.

pub mod engine;
pub mod file;

pub use engine::apply_batch;
pub use file::{BatchFile, BatchFileError, parse_batch_file};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{ScheduleDraft, ScheduleEdit};
use crate::error::{ErrorKind, WorkbenchError};

/// One schedule operation within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BatchOperation {
    Create(ScheduleDraft),
    Update(ScheduleEdit),
    Delete { schedule_id: Uuid },
    TransitionStatus { schedule_id: Uuid, status: String },
}

impl BatchOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete { .. } => "delete",
            Self::TransitionStatus { .. } => "transition_status",
        }
    }

    /// The schedule this operation targets, if it targets an existing one.
    pub fn schedule_id(&self) -> Option<Uuid> {
        match self {
            Self::Create(_) => None,
            Self::Update(edit) => Some(edit.schedule_id),
            Self::Delete { schedule_id } | Self::TransitionStatus { schedule_id, .. } => {
                Some(*schedule_id)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Success,
    Failure,
    Cancelled,
}

/// Outcome of one operation, keyed by its position in the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub operation_index: usize,
    pub outcome: ItemOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set for successful `create` operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_id: Option<Uuid>,
}

impl BatchItemResult {
    pub fn success(operation_index: usize, created_id: Option<Uuid>) -> Self {
        Self {
            operation_index,
            outcome: ItemOutcome::Success,
            error_kind: None,
            message: None,
            created_id,
        }
    }

    pub fn failure(operation_index: usize, err: &WorkbenchError) -> Self {
        Self {
            operation_index,
            outcome: ItemOutcome::Failure,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
            created_id: None,
        }
    }

    pub fn cancelled(operation_index: usize) -> Self {
        Self {
            operation_index,
            outcome: ItemOutcome::Cancelled,
            error_kind: Some(ErrorKind::Cancelled),
            message: Some(WorkbenchError::Cancelled.to_string()),
            created_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ItemOutcome::Success
    }
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOperationResult {
    pub items: Vec<BatchItemResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl BatchOperationResult {
    /// Tally counts from `items`.
    pub fn from_items(items: Vec<BatchItemResult>) -> Self {
        let count = |outcome| items.iter().filter(|i| i.outcome == outcome).count();
        let succeeded = count(ItemOutcome::Success);
        let failed = count(ItemOutcome::Failure);
        let cancelled = count(ItemOutcome::Cancelled);
        let total = items.len();
        Self {
            items,
            succeeded,
            failed,
            cancelled,
            total,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}
