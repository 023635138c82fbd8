use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use syllabus_db::models::{NewSchedule, Schedule, ScheduleStatus, ScheduleUpdate};

use super::optional_text;
use crate::error::{WorkbenchError, WorkbenchResult};

pub const MAX_RESOURCE_LEN: usize = 120;

/// Operator input for a new schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Defaults to `scheduled` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl ScheduleDraft {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            starts_at,
            ends_at,
            status: None,
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn validate(&self, plan_id: Uuid) -> WorkbenchResult<NewSchedule> {
        check_window(self.starts_at, self.ends_at)?;
        let status = match self.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => ScheduleStatus::Scheduled,
        };
        Ok(NewSchedule {
            plan_id,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            status,
            resource: optional_text("resource", self.resource.as_deref(), MAX_RESOURCE_LEN)?,
        })
    }
}

/// Partial edit of an existing schedule. Omitted fields stay unchanged;
/// status changes go through the state machine instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEdit {
    pub schedule_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Remove the resource label. Wins over `resource`.
    #[serde(default)]
    pub clear_resource: bool,
}

impl ScheduleEdit {
    pub fn new(schedule_id: Uuid) -> Self {
        Self {
            schedule_id,
            starts_at: None,
            ends_at: None,
            resource: None,
            clear_resource: false,
        }
    }

    /// Merge this edit over `current`, producing a version-guarded update.
    pub fn apply(&self, current: &Schedule) -> WorkbenchResult<ScheduleUpdate> {
        let starts_at = self.starts_at.unwrap_or(current.starts_at);
        let ends_at = self.ends_at.unwrap_or(current.ends_at);
        check_window(starts_at, ends_at)?;

        let resource = if self.clear_resource {
            None
        } else if self.resource.is_some() {
            optional_text("resource", self.resource.as_deref(), MAX_RESOURCE_LEN)?
        } else {
            current.resource.clone()
        };

        Ok(ScheduleUpdate {
            id: current.id,
            expected_version: current.version,
            starts_at,
            ends_at,
            status: current.status,
            resource,
        })
    }
}

/// Strict status parsing for operator input.
pub fn parse_status(raw: &str) -> WorkbenchResult<ScheduleStatus> {
    raw.trim()
        .parse()
        .map_err(|e| WorkbenchError::validation(format!("{e}")))
}

fn check_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> WorkbenchResult<()> {
    if ends_at <= starts_at {
        return Err(WorkbenchError::validation(format!(
            "schedule must end after it starts ({starts_at} .. {ends_at})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::error::ErrorKind;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, hour, minute, 0).unwrap()
    }

    fn existing() -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            starts_at: at(9, 0),
            ends_at: at(10, 0),
            status: ScheduleStatus::Postponed,
            resource: Some("Room 12".to_string()),
            version: 4,
            created_at: at(8, 0),
            updated_at: at(8, 0),
        }
    }

    #[test]
    fn draft_defaults_to_scheduled() {
        let plan_id = Uuid::new_v4();
        let new = ScheduleDraft::new(at(9, 0), at(10, 0)).validate(plan_id).unwrap();
        assert_eq!(new.status, ScheduleStatus::Scheduled);
        assert_eq!(new.plan_id, plan_id);
        assert_eq!(new.resource, None);
    }

    #[test]
    fn draft_rejects_empty_or_inverted_window() {
        let err = ScheduleDraft::new(at(10, 0), at(9, 30))
            .validate(Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        assert!(
            ScheduleDraft::new(at(10, 0), at(10, 0))
                .validate(Uuid::new_v4())
                .is_err()
        );
    }

    #[test]
    fn draft_status_is_parsed_strictly() {
        let ok = ScheduleDraft::new(at(9, 0), at(10, 0))
            .with_status("in_progress")
            .validate(Uuid::new_v4())
            .unwrap();
        assert_eq!(ok.status, ScheduleStatus::InProgress);

        for bad in ["unknown", "done", ""] {
            let err = ScheduleDraft::new(at(9, 0), at(10, 0))
                .with_status(bad)
                .validate(Uuid::new_v4())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError, "status {bad:?}");
        }
    }

    #[test]
    fn draft_resource_is_normalized() {
        let new = ScheduleDraft::new(at(9, 0), at(10, 0))
            .with_resource("  ")
            .validate(Uuid::new_v4())
            .unwrap();
        assert_eq!(new.resource, None);

        let long = "r".repeat(MAX_RESOURCE_LEN + 1);
        assert!(
            ScheduleDraft::new(at(9, 0), at(10, 0))
                .with_resource(long)
                .validate(Uuid::new_v4())
                .is_err()
        );
    }

    #[test]
    fn edit_keeps_omitted_fields_and_status() {
        let current = existing();
        let mut edit = ScheduleEdit::new(current.id);
        edit.ends_at = Some(at(10, 30));

        let update = edit.apply(&current).unwrap();
        assert_eq!(update.starts_at, current.starts_at);
        assert_eq!(update.ends_at, at(10, 30));
        assert_eq!(update.status, ScheduleStatus::Postponed);
        assert_eq!(update.resource.as_deref(), Some("Room 12"));
        assert_eq!(update.expected_version, 4);
    }

    #[test]
    fn edit_can_set_or_clear_resource() {
        let current = existing();

        let mut set = ScheduleEdit::new(current.id);
        set.resource = Some(" Lab 3 ".to_string());
        assert_eq!(set.apply(&current).unwrap().resource.as_deref(), Some("Lab 3"));

        let mut clear = ScheduleEdit::new(current.id);
        clear.resource = Some("ignored".to_string());
        clear.clear_resource = true;
        assert_eq!(clear.apply(&current).unwrap().resource, None);
    }

    #[test]
    fn edit_validates_merged_window() {
        let current = existing();
        let mut edit = ScheduleEdit::new(current.id);
        edit.starts_at = Some(current.ends_at + Duration::minutes(5));
        assert!(edit.apply(&current).is_err());
    }
}
