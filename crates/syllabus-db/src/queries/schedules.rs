//! Database query functions for the `schedules` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewSchedule, Schedule, ScheduleUpdate};

/// Insert a new schedule. The slot unique index and the window CHECK surface
/// as [`StoreError::ConstraintViolation`].
pub async fn insert_schedule(pool: &PgPool, schedule: &NewSchedule) -> StoreResult<Schedule> {
    let schedule = sqlx::query_as::<_, Schedule>(
        "INSERT INTO schedules (plan_id, starts_at, ends_at, status, resource) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(schedule.plan_id)
    .bind(schedule.starts_at)
    .bind(schedule.ends_at)
    .bind(schedule.status)
    .bind(&schedule.resource)
    .fetch_one(pool)
    .await?;

    Ok(schedule)
}

/// Fetch a single schedule by ID.
pub async fn get_schedule(pool: &PgPool, id: Uuid) -> StoreResult<Option<Schedule>> {
    let schedule = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(schedule)
}

/// List all schedules of a plan, ordered by start time then id.
pub async fn list_schedules_for_plan(pool: &PgPool, plan_id: Uuid) -> StoreResult<Vec<Schedule>> {
    let schedules = sqlx::query_as::<_, Schedule>(
        "SELECT * FROM schedules WHERE plan_id = $1 ORDER BY starts_at ASC, id ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

/// Replace a schedule's mutable fields.
///
/// Uses optimistic locking: the WHERE clause includes
/// `version = expected_version`, and a successful write bumps the version.
/// When no row matches, a follow-up read distinguishes "gone" from "changed
/// underneath us".
///
/// An `unknown` status leaves the stored column as it is, so values written
/// by other tooling survive window and resource edits.
pub async fn update_schedule(pool: &PgPool, update: &ScheduleUpdate) -> StoreResult<Schedule> {
    let updated = sqlx::query_as::<_, Schedule>(
        "UPDATE schedules \
         SET starts_at = $1, \
             ends_at = $2, \
             status = CASE WHEN $3 = 'unknown' THEN status ELSE $3 END, \
             resource = $4, \
             version = version + 1, \
             updated_at = now() \
         WHERE id = $5 AND version = $6 \
         RETURNING *",
    )
    .bind(update.starts_at)
    .bind(update.ends_at)
    .bind(update.status)
    .bind(&update.resource)
    .bind(update.id)
    .bind(update.expected_version)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(schedule) => Ok(schedule),
        None => Err(version_miss(pool, update.id, update.expected_version).await?),
    }
}

/// Delete a schedule, guarded by the version the caller last read.
/// Schedule-level participants cascade.
pub async fn delete_schedule(pool: &PgPool, id: Uuid, expected_version: i32) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = $1 AND version = $2")
        .bind(id)
        .bind(expected_version)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(version_miss(pool, id, expected_version).await?);
    }

    Ok(())
}

/// Build the error for a guarded write that matched no row.
async fn version_miss(pool: &PgPool, id: Uuid, expected_version: i32) -> StoreResult<StoreError> {
    let current: Option<(i32,)> = sqlx::query_as("SELECT version FROM schedules WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(match current {
        None => StoreError::not_found("schedule", id),
        Some((version,)) => StoreError::ConcurrentModification(format!(
            "schedule {id} is at version {version}, expected {expected_version}"
        )),
    })
}
