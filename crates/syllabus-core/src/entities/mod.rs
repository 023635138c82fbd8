//! Validated construction of plans, schedules and participants.
//!
//! Forms and drafts carry raw operator input. Each validates into the
//! matching `syllabus_db::models` write model; nothing reaches the store
//! without passing through here.

pub mod participant;
pub mod plan;
pub mod schedule;

pub use participant::ParticipantForm;
pub use plan::PlanForm;
pub use schedule::{ScheduleDraft, ScheduleEdit};

use crate::error::{WorkbenchError, WorkbenchResult};

/// Trim `raw` and require it to be non-empty and at most `max` characters.
pub(crate) fn required_text(field: &str, raw: &str, max: usize) -> WorkbenchResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WorkbenchError::validation(format!("{field} must not be empty")));
    }
    check_len(field, trimmed, max)?;
    Ok(trimmed.to_owned())
}

/// Trim `raw`; empty input becomes `None`.
pub(crate) fn optional_text(
    field: &str,
    raw: Option<&str>,
    max: usize,
) -> WorkbenchResult<Option<String>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => {
            check_len(field, value, max)?;
            Ok(Some(value.to_owned()))
        }
        None => Ok(None),
    }
}

fn check_len(field: &str, value: &str, max: usize) -> WorkbenchResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(WorkbenchError::validation(format!(
            "{field} is {len} characters, at most {max} allowed"
        )));
    }
    Ok(())
}
