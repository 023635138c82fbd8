//! Database query functions for the `participants` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewParticipant, Participant, ParticipantTarget};

/// Attach a participant. The per-level unique indexes surface a repeated
/// person as [`StoreError::ConstraintViolation`].
pub async fn insert_participant(
    pool: &PgPool,
    participant: &NewParticipant,
) -> StoreResult<Participant> {
    let schedule_id = match participant.target {
        ParticipantTarget::Plan(_) => None,
        ParticipantTarget::Schedule(id) => Some(id),
    };

    // The SELECT guard keeps a schedule-level row inside its own plan.
    let inserted = sqlx::query_as::<_, Participant>(
        "INSERT INTO participants (plan_id, schedule_id, person, level) \
         SELECT $1, $2, $3, $4 \
         WHERE $2::uuid IS NULL \
            OR EXISTS (SELECT 1 FROM schedules WHERE id = $2 AND plan_id = $1) \
         RETURNING *",
    )
    .bind(participant.plan_id)
    .bind(schedule_id)
    .bind(&participant.person)
    .bind(participant.target.level())
    .fetch_optional(pool)
    .await?;

    inserted.ok_or_else(|| {
        StoreError::ConstraintViolation(format!(
            "{} does not belong to plan {}",
            participant.target, participant.plan_id
        ))
    })
}

/// List the participants attached at exactly `target`, oldest first.
pub async fn list_participants(
    pool: &PgPool,
    target: ParticipantTarget,
) -> StoreResult<Vec<Participant>> {
    let participants = match target {
        ParticipantTarget::Plan(plan_id) => {
            sqlx::query_as::<_, Participant>(
                "SELECT * FROM participants \
                 WHERE plan_id = $1 AND schedule_id IS NULL \
                 ORDER BY attached_at ASC, id ASC",
            )
            .bind(plan_id)
            .fetch_all(pool)
            .await?
        }
        ParticipantTarget::Schedule(schedule_id) => {
            sqlx::query_as::<_, Participant>(
                "SELECT * FROM participants \
                 WHERE schedule_id = $1 \
                 ORDER BY attached_at ASC, id ASC",
            )
            .bind(schedule_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(participants)
}

/// Remove a participant attached at `target`. Returns `false` when no such
/// attachment existed there.
pub async fn delete_participant(
    pool: &PgPool,
    target: ParticipantTarget,
    participant_id: Uuid,
) -> StoreResult<bool> {
    let result = match target {
        ParticipantTarget::Plan(plan_id) => {
            sqlx::query(
                "DELETE FROM participants \
                 WHERE id = $1 AND plan_id = $2 AND schedule_id IS NULL",
            )
            .bind(participant_id)
            .bind(plan_id)
            .execute(pool)
            .await?
        }
        ParticipantTarget::Schedule(schedule_id) => {
            sqlx::query("DELETE FROM participants WHERE id = $1 AND schedule_id = $2")
                .bind(participant_id)
                .bind(schedule_id)
                .execute(pool)
                .await?
        }
    };

    Ok(result.rows_affected() > 0)
}
