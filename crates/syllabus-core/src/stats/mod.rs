//! Per-plan progress statistics.

use serde::{Deserialize, Serialize};

use syllabus_db::models::{Plan, Schedule, ScheduleStatus};

/// Number of schedules in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub scheduled: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub postponed: usize,
    pub unknown: usize,
}

impl StatusCounts {
    fn record(&mut self, status: ScheduleStatus) {
        let slot = match status {
            ScheduleStatus::Scheduled => &mut self.scheduled,
            ScheduleStatus::InProgress => &mut self.in_progress,
            ScheduleStatus::Completed => &mut self.completed,
            ScheduleStatus::Cancelled => &mut self.cancelled,
            ScheduleStatus::Postponed => &mut self.postponed,
            ScheduleStatus::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    pub fn get(&self, status: ScheduleStatus) -> usize {
        match status {
            ScheduleStatus::Scheduled => self.scheduled,
            ScheduleStatus::InProgress => self.in_progress,
            ScheduleStatus::Completed => self.completed,
            ScheduleStatus::Cancelled => self.cancelled,
            ScheduleStatus::Postponed => self.postponed,
            ScheduleStatus::Unknown => self.unknown,
        }
    }
}

/// Derived, read-only view of a plan's schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub counts: StatusCounts,
    pub total: usize,
    /// `completed / total`, or 0 for a plan without schedules.
    pub completion_ratio: f64,
    /// Earliest-starting schedule that is still open.
    pub next_upcoming: Option<Schedule>,
}

/// Compute statistics for `plan`. Schedules belonging to other plans are
/// ignored.
pub fn compute(plan: &Plan, schedules: &[Schedule]) -> StatsSnapshot {
    let mut counts = StatusCounts::default();
    let mut total = 0usize;
    let mut next: Option<&Schedule> = None;

    for schedule in schedules.iter().filter(|s| s.plan_id == plan.id) {
        counts.record(schedule.status);
        total += 1;

        if is_open(schedule.status) {
            let earlier = next.is_none_or(|current| {
                (schedule.starts_at, schedule.id) < (current.starts_at, current.id)
            });
            if earlier {
                next = Some(schedule);
            }
        }
    }

    let completion_ratio = if total == 0 {
        0.0
    } else {
        counts.completed as f64 / total as f64
    };

    StatsSnapshot {
        counts,
        total,
        completion_ratio,
        next_upcoming: next.cloned(),
    }
}

fn is_open(status: ScheduleStatus) -> bool {
    matches!(
        status,
        ScheduleStatus::Scheduled | ScheduleStatus::InProgress | ScheduleStatus::Postponed
    )
}
