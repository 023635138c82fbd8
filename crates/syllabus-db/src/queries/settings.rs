//! Database query functions for the `owner_settings` table.

use sqlx::PgPool;

use crate::error::StoreResult;

/// Fetch the stored settings document for an owner.
pub async fn get_settings(pool: &PgPool, owner: &str) -> StoreResult<Option<serde_json::Value>> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as("SELECT settings FROM owner_settings WHERE owner = $1")
            .bind(owner)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(settings,)| settings))
}

/// Insert or replace the settings document for an owner.
pub async fn upsert_settings(
    pool: &PgPool,
    owner: &str,
    settings: &serde_json::Value,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO owner_settings (owner, settings) VALUES ($1, $2) \
         ON CONFLICT (owner) DO UPDATE \
         SET settings = EXCLUDED.settings, updated_at = now()",
    )
    .bind(owner)
    .bind(settings)
    .execute(pool)
    .await?;

    Ok(())
}
