//! Interfaces to remote services the workbench hands work off to.
//!
//! No workbench operation calls these. They are seams for consumers to
//! implement, and the in-memory implementations back each module's tests.

pub mod activation;
pub mod object_storage;

pub use activation::{ActivationKeys, InMemoryActivationKeys, Redemption};
pub use object_storage::{DeleteOutcome, InMemoryObjectStorage, ObjectStorage, StreamUrl};

/// Failure reported by a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
