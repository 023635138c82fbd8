//! Database query functions for the `plans` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{NewPlan, Plan};

/// Insert a new plan row. Returns the plan with server-generated defaults
/// (id, created_at).
pub async fn insert_plan(pool: &PgPool, plan: &NewPlan) -> StoreResult<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (title, owner) \
         VALUES ($1, $2) \
         RETURNING *",
    )
    .bind(&plan.title)
    .bind(&plan.owner)
    .fetch_one(pool)
    .await?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> StoreResult<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(plan)
}

/// List all plans, newest first.
pub async fn list_plans(pool: &PgPool) -> StoreResult<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>("SELECT * FROM plans ORDER BY created_at DESC, id")
        .fetch_all(pool)
        .await?;

    Ok(plans)
}

/// Delete a plan. Schedules and participants go with it through
/// `ON DELETE CASCADE`. Returns `false` when no such plan existed.
pub async fn delete_plan(pool: &PgPool, id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
