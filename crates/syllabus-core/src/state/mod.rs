//! Schedule status transitions.

use syllabus_db::models::{Schedule, ScheduleStatus, ScheduleUpdate};

use crate::error::{WorkbenchError, WorkbenchResult};

/// The schedule state machine.
///
/// Enforces the transition graph:
///
/// ```text
/// scheduled   -> in_progress
/// scheduled   -> cancelled
/// scheduled   -> postponed
/// in_progress -> completed
/// in_progress -> cancelled
/// postponed   -> scheduled
/// postponed   -> cancelled
/// ```
///
/// `completed` and `cancelled` are terminal. `unknown` has no outbound
/// edges, and no status has an edge to itself.
pub struct ScheduleStateMachine;

impl ScheduleStateMachine {
    pub fn is_valid_transition(from: ScheduleStatus, to: ScheduleStatus) -> bool {
        matches!(
            (from, to),
            (ScheduleStatus::Scheduled, ScheduleStatus::InProgress)
                | (ScheduleStatus::Scheduled, ScheduleStatus::Cancelled)
                | (ScheduleStatus::Scheduled, ScheduleStatus::Postponed)
                | (ScheduleStatus::InProgress, ScheduleStatus::Completed)
                | (ScheduleStatus::InProgress, ScheduleStatus::Cancelled)
                | (ScheduleStatus::Postponed, ScheduleStatus::Scheduled)
                | (ScheduleStatus::Postponed, ScheduleStatus::Cancelled)
        )
    }

    /// Statuses reachable from `from` in one step.
    pub fn successors(from: ScheduleStatus) -> Vec<ScheduleStatus> {
        ScheduleStatus::CANONICAL
            .into_iter()
            .filter(|to| Self::is_valid_transition(from, *to))
            .collect()
    }

    /// Build the version-guarded update that moves `schedule` to `to`.
    ///
    /// `schedule` itself is never modified; the caller persists the update.
    pub fn transition(schedule: &Schedule, to: ScheduleStatus) -> WorkbenchResult<ScheduleUpdate> {
        if !Self::is_valid_transition(schedule.status, to) {
            return Err(WorkbenchError::InvalidTransition {
                current: schedule.status,
                requested: to,
            });
        }
        Ok(ScheduleUpdate {
            id: schedule.id,
            expected_version: schedule.version,
            starts_at: schedule.starts_at,
            ends_at: schedule.ends_at,
            status: to,
            resource: schedule.resource.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postponed_can_be_rescheduled() {
        assert_eq!(
            ScheduleStateMachine::successors(ScheduleStatus::Postponed),
            vec![ScheduleStatus::Scheduled, ScheduleStatus::Cancelled]
        );
    }

    #[test]
    fn terminal_and_unknown_have_no_successors() {
        for from in [
            ScheduleStatus::Completed,
            ScheduleStatus::Cancelled,
            ScheduleStatus::Unknown,
        ] {
            assert!(ScheduleStateMachine::successors(from).is_empty(), "{from}");
        }
    }
}
