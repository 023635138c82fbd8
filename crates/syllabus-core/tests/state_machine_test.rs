//! Transition graph tests for [`ScheduleStateMachine`].

mod common;

use syllabus_core::ErrorKind;
use syllabus_core::WorkbenchError;
use syllabus_core::state::ScheduleStateMachine;
use syllabus_db::models::{Schedule, ScheduleStatus};
use uuid::Uuid;

use common::at;

const ALL: [ScheduleStatus; 6] = [
    ScheduleStatus::Scheduled,
    ScheduleStatus::InProgress,
    ScheduleStatus::Completed,
    ScheduleStatus::Cancelled,
    ScheduleStatus::Postponed,
    ScheduleStatus::Unknown,
];

const EDGES: [(ScheduleStatus, ScheduleStatus); 7] = [
    (ScheduleStatus::Scheduled, ScheduleStatus::InProgress),
    (ScheduleStatus::Scheduled, ScheduleStatus::Cancelled),
    (ScheduleStatus::Scheduled, ScheduleStatus::Postponed),
    (ScheduleStatus::InProgress, ScheduleStatus::Completed),
    (ScheduleStatus::InProgress, ScheduleStatus::Cancelled),
    (ScheduleStatus::Postponed, ScheduleStatus::Scheduled),
    (ScheduleStatus::Postponed, ScheduleStatus::Cancelled),
];

fn schedule(status: ScheduleStatus) -> Schedule {
    Schedule {
        id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        starts_at: at(9, 0),
        ends_at: at(10, 0),
        status,
        resource: Some("Room 2".to_string()),
        version: 3,
        created_at: at(8, 0),
        updated_at: at(8, 0),
    }
}

#[test]
fn accepted_exactly_on_listed_edges() {
    for from in ALL {
        for to in ALL {
            let expected = EDGES.contains(&(from, to));
            assert_eq!(
                ScheduleStateMachine::is_valid_transition(from, to),
                expected,
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn no_self_transitions() {
    for status in ALL {
        assert!(!ScheduleStateMachine::is_valid_transition(status, status));
    }
}

#[test]
fn valid_transition_carries_version_and_fields() {
    let current = schedule(ScheduleStatus::Scheduled);
    let update = ScheduleStateMachine::transition(&current, ScheduleStatus::InProgress).unwrap();
    assert_eq!(update.id, current.id);
    assert_eq!(update.expected_version, 3);
    assert_eq!(update.status, ScheduleStatus::InProgress);
    assert_eq!(update.starts_at, current.starts_at);
    assert_eq!(update.resource, current.resource);
}

#[test]
fn completed_cannot_be_cancelled() {
    let current = schedule(ScheduleStatus::Completed);
    let err =
        ScheduleStateMachine::transition(&current, ScheduleStatus::Cancelled).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert!(
        matches!(
            err,
            WorkbenchError::InvalidTransition {
                current: ScheduleStatus::Completed,
                requested: ScheduleStatus::Cancelled,
            }
        ),
        "got {err:?}"
    );
    assert_eq!(current.status, ScheduleStatus::Completed);
}

#[test]
fn unknown_status_is_stuck() {
    let current = schedule(ScheduleStatus::Unknown);
    for to in ScheduleStatus::CANONICAL {
        assert!(ScheduleStateMachine::transition(&current, to).is_err(), "-> {to}");
    }
}
