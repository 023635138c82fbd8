use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, FromRow, Postgres, Type};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a schedule.
///
/// `Unknown` is what a stored value outside the five canonical statuses
/// decodes to. It is never accepted as operator input (see [`FromStr`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Postponed,
    Unknown,
}

impl ScheduleStatus {
    /// The five canonical statuses, in declaration order.
    pub const CANONICAL: [ScheduleStatus; 5] = [
        Self::Scheduled,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::Postponed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Postponed => "postponed",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient decoding for values read back from storage.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = ScheduleStatusParseError;

    /// Strict parsing: only the five canonical statuses are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "postponed" => Ok(Self::Postponed),
            other => Err(ScheduleStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognized [`ScheduleStatus`] string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStatusParseError(pub String);

impl fmt::Display for ScheduleStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schedule status: {:?}", self.0)
    }
}

impl std::error::Error for ScheduleStatusParseError {}

// Stored as TEXT. Decoding goes through `from_stored` so foreign values
// surface as `Unknown` instead of failing the whole row.

impl Type<Postgres> for ScheduleStatus {
    fn type_info() -> PgTypeInfo {
        <str as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <str as Type<Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Postgres> for ScheduleStatus {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <&str as Encode<'q, Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for ScheduleStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<'r, Postgres>>::decode(value)?;
        Ok(Self::from_stored(raw))
    }
}

// ---------------------------------------------------------------------------

/// Nesting level a participant is attached at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantLevel {
    Plan,
    Schedule,
}

impl fmt::Display for ParticipantLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plan => "plan",
            Self::Schedule => "schedule",
        };
        f.write_str(s)
    }
}

/// Where a participant is attached: a whole plan or a single schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "snake_case")]
pub enum ParticipantTarget {
    Plan(Uuid),
    Schedule(Uuid),
}

impl ParticipantTarget {
    pub fn level(self) -> ParticipantLevel {
        match self {
            Self::Plan(_) => ParticipantLevel::Plan,
            Self::Schedule(_) => ParticipantLevel::Schedule,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Plan(id) | Self::Schedule(id) => id,
        }
    }
}

impl fmt::Display for ParticipantTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level(), self.id())
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A teaching plan: the container for one schedule cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub title: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// One time-boxed session within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub resource: Option<String>,
    /// Optimistic-lock counter, bumped on every write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person attached to a plan or to one of its schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub plan_id: Uuid,
    /// Set only for schedule-level attachments.
    pub schedule_id: Option<Uuid>,
    pub person: String,
    pub level: ParticipantLevel,
    pub attached_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Write models
// ---------------------------------------------------------------------------

/// A validated plan ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlan {
    pub title: String,
    pub owner: String,
}

/// A validated schedule ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    pub plan_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub resource: Option<String>,
}

/// Full replacement of a schedule's mutable fields, guarded by the version
/// the caller last read. A status of [`ScheduleStatus::Unknown`] keeps the
/// stored status untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleUpdate {
    pub id: Uuid,
    pub expected_version: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub resource: Option<String>,
}

/// A validated participant attachment ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParticipant {
    /// Owning plan. For schedule-level attachments this is the schedule's plan.
    pub plan_id: Uuid,
    pub target: ParticipantTarget,
    pub person: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_statuses_parse_strictly() {
        for status in ScheduleStatus::CANONICAL {
            let parsed: ScheduleStatus = status.as_str().parse().expect("should parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_is_not_valid_input() {
        assert!("unknown".parse::<ScheduleStatus>().is_err());
        assert!("Scheduled".parse::<ScheduleStatus>().is_err());
    }

    #[test]
    fn stored_values_decode_leniently() {
        assert_eq!(ScheduleStatus::from_stored("postponed"), ScheduleStatus::Postponed);
        assert_eq!(ScheduleStatus::from_stored("archived"), ScheduleStatus::Unknown);
        assert_eq!(ScheduleStatus::from_stored(""), ScheduleStatus::Unknown);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ScheduleStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn target_reports_level_and_id() {
        let id = Uuid::new_v4();
        assert_eq!(ParticipantTarget::Plan(id).level(), ParticipantLevel::Plan);
        assert_eq!(ParticipantTarget::Schedule(id).level(), ParticipantLevel::Schedule);
        assert_eq!(ParticipantTarget::Schedule(id).id(), id);
        assert_eq!(
            ParticipantTarget::Plan(id).to_string(),
            format!("plan {id}")
        );
    }

    #[test]
    fn target_serializes_adjacently_tagged() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ParticipantTarget::Schedule(id)).unwrap();
        assert_eq!(json["level"], "schedule");
        assert_eq!(json["id"], id.to_string());
    }
}
