//! Display and ranking data for schedule statuses.
//!
//! Everything here is a lookup over [`ScheduleStatus`] through a single
//! exhaustive match, so adding a status is a compile error until it has a
//! label, an icon and a priority.

use serde::Serialize;

use syllabus_db::models::ScheduleStatus;

/// Presentation attributes of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    /// Icon tag for front-ends; carries no behavior.
    pub icon: &'static str,
    /// Triage rank. Lower is more urgent.
    pub priority: u8,
}

/// Look up the display attributes of `status`.
pub fn display(status: ScheduleStatus) -> StatusDisplay {
    let (label, icon, priority) = match status {
        ScheduleStatus::InProgress => ("In progress", "play", 0),
        ScheduleStatus::Scheduled => ("Scheduled", "calendar", 1),
        ScheduleStatus::Postponed => ("Postponed", "clock", 2),
        ScheduleStatus::Completed => ("Completed", "check", 3),
        ScheduleStatus::Cancelled => ("Cancelled", "x", 4),
        ScheduleStatus::Unknown => ("Unknown", "help", 5),
    };
    StatusDisplay {
        label,
        icon,
        priority,
    }
}

pub fn priority(status: ScheduleStatus) -> u8 {
    display(status).priority
}

/// Completed and cancelled schedules never change status again.
pub fn is_terminal(status: ScheduleStatus) -> bool {
    matches!(status, ScheduleStatus::Completed | ScheduleStatus::Cancelled)
}

/// Sort `items` by status priority, then by `key_of`.
///
/// The sort is stable: items with equal priority and equal key keep their
/// input order.
pub fn sort_by_priority<T, K, S, F>(items: &mut [T], status_of: S, key_of: F)
where
    K: Ord,
    S: Fn(&T) -> ScheduleStatus,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| {
        priority(status_of(a))
            .cmp(&priority(status_of(b)))
            .then_with(|| key_of(a).cmp(&key_of(b)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ScheduleStatus; 6] = [
        ScheduleStatus::Scheduled,
        ScheduleStatus::InProgress,
        ScheduleStatus::Completed,
        ScheduleStatus::Cancelled,
        ScheduleStatus::Postponed,
        ScheduleStatus::Unknown,
    ];

    #[test]
    fn priorities_are_distinct() {
        let mut seen: Vec<u8> = ALL.iter().map(|s| priority(*s)).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), ALL.len());
    }

    #[test]
    fn in_progress_outranks_everything() {
        for status in ALL {
            assert!(priority(ScheduleStatus::InProgress) <= priority(status));
        }
        assert_eq!(priority(ScheduleStatus::Unknown), 5);
    }

    #[test]
    fn unknown_has_its_own_display() {
        let d = display(ScheduleStatus::Unknown);
        assert_eq!(d.label, "Unknown");
        assert_eq!(d.icon, "help");
    }

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal(ScheduleStatus::Completed));
        assert!(is_terminal(ScheduleStatus::Cancelled));
        assert!(!is_terminal(ScheduleStatus::Postponed));
        assert!(!is_terminal(ScheduleStatus::Unknown));
    }

    #[test]
    fn sort_breaks_ties_by_key() {
        let mut items = vec![
            (ScheduleStatus::Completed, 1, "a"),
            (ScheduleStatus::Scheduled, 9, "b"),
            (ScheduleStatus::InProgress, 5, "c"),
            (ScheduleStatus::Scheduled, 3, "d"),
        ];
        sort_by_priority(&mut items, |i| i.0, |i| i.1);
        let order: Vec<_> = items.iter().map(|i| i.2).collect();
        assert_eq!(order, vec!["c", "d", "b", "a"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut items = vec![
            (ScheduleStatus::Postponed, 7, "first"),
            (ScheduleStatus::Scheduled, 7, "x"),
            (ScheduleStatus::Postponed, 7, "second"),
            (ScheduleStatus::Postponed, 7, "third"),
        ];
        sort_by_priority(&mut items, |i| i.0, |i| i.1);
        let order: Vec<_> = items.iter().map(|i| i.2).collect();
        assert_eq!(order, vec!["x", "first", "second", "third"]);
    }
}
