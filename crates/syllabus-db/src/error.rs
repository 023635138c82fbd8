//! Typed failures reported by a [`crate::store::WorkbenchStore`].

use uuid::Uuid;

/// Failure returned by every store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("store timed out: {0}")]
    Timeout(String),

    #[error("failed to encode stored value: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Backend(#[source] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::PoolTimedOut) {
            return Self::Timeout("timed out acquiring a database connection".to_owned());
        }

        if let Some(db) = err.as_database_error() {
            let message = db.message().to_owned();
            if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
            {
                return Self::ConstraintViolation(message);
            }
            let code = db.code().map(|c| c.into_owned());
            match code.as_deref() {
                // serialization_failure, deadlock_detected
                Some("40001" | "40P01") => return Self::ConcurrentModification(message),
                // query_canceled (statement_timeout)
                Some("57014") => return Self::Timeout(message),
                _ => {}
            }
        }

        Self::Backend(err)
    }
}
