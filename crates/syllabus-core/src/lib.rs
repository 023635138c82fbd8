//! Schedule plan workbench: status model, validated entities, the batch
//! operation engine, per-plan statistics and the orchestrating service.

pub mod batch;
pub mod collaborators;
pub mod entities;
pub mod error;
pub mod settings;
pub mod state;
pub mod stats;
pub mod status;
pub mod workbench;

pub use error::{ErrorKind, WorkbenchError};
pub use workbench::Workbench;
