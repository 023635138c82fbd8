//! Error taxonomy for workbench operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use syllabus_db::error::StoreError;
use syllabus_db::models::{ParticipantTarget, ScheduleStatus};

/// Failure of a single workbench operation or batch item.
#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid status transition: {current} -> {requested}")]
    InvalidTransition {
        current: ScheduleStatus,
        requested: ScheduleStatus,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{person:?} is already attached at {target}")]
    DuplicateParticipant {
        person: String,
        target: ParticipantTarget,
    },

    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("operation cancelled before it started")]
    Cancelled,

    #[error("store timed out: {0}")]
    Timeout(String),

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

pub type WorkbenchResult<T> = Result<T, WorkbenchError>;

impl WorkbenchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateParticipant { .. } => ErrorKind::DuplicateParticipant,
            Self::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            Self::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<StoreError> for WorkbenchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::ConstraintViolation(msg) => Self::ConstraintViolation(msg),
            StoreError::ConcurrentModification(msg) => Self::ConcurrentModification(msg),
            StoreError::Timeout(msg) => Self::Timeout(msg),
            other => Self::Storage(other),
        }
    }
}

/// Serializable classification of a [`WorkbenchError`], reported per batch
/// item and by the HTTP adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    InvalidTransition,
    NotFound,
    DuplicateParticipant,
    ConcurrentModification,
    ConstraintViolation,
    Cancelled,
    Timeout,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ValidationError => "validation_error",
            Self::InvalidTransition => "invalid_transition",
            Self::NotFound => "not_found",
            Self::DuplicateParticipant => "duplicate_participant",
            Self::ConcurrentModification => "concurrent_modification",
            Self::ConstraintViolation => "constraint_violation",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}
