use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::CollaboratorError;

/// Result of redeeming an activation key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redemption {
    pub success: bool,
    /// Account tier granted by the key.
    pub new_user_type: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Activation-key service.
#[async_trait]
pub trait ActivationKeys: Send + Sync {
    async fn redeem(&self, key: &str, user_id: &str) -> Result<Redemption, CollaboratorError>;
}

#[derive(Debug, Clone)]
struct KeyGrant {
    user_type: String,
    expires_at: Option<DateTime<Utc>>,
    redeemed_by: Option<String>,
}

/// Single-use keys held in memory.
#[derive(Debug, Default)]
pub struct InMemoryActivationKeys {
    keys: Mutex<HashMap<String, KeyGrant>>,
}

impl InMemoryActivationKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn issue(
        &self,
        key: impl Into<String>,
        user_type: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.keys.lock().await.insert(
            key.into(),
            KeyGrant {
                user_type: user_type.into(),
                expires_at,
                redeemed_by: None,
            },
        );
    }
}

#[async_trait]
impl ActivationKeys for InMemoryActivationKeys {
    /// An unknown key is `NotFound`. A key already redeemed by someone else,
    /// or past its expiry, redeems unsuccessfully. Redeeming again as the
    /// same user repeats the original grant.
    async fn redeem(&self, key: &str, user_id: &str) -> Result<Redemption, CollaboratorError> {
        let mut keys = self.keys.lock().await;
        let grant = keys
            .get_mut(key)
            .ok_or_else(|| CollaboratorError::NotFound(format!("activation key {key:?}")))?;

        let expired = grant.expires_at.is_some_and(|at| at <= Utc::now());
        let taken = grant
            .redeemed_by
            .as_deref()
            .is_some_and(|by| by != user_id);
        if expired || taken {
            return Ok(Redemption {
                success: false,
                new_user_type: None,
                expires_at: grant.expires_at,
            });
        }

        grant.redeemed_by = Some(user_id.to_owned());
        Ok(Redemption {
            success: true,
            new_user_type: Some(grant.user_type.clone()),
            expires_at: grant.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn keys_are_single_use() {
        let keys = InMemoryActivationKeys::new();
        keys.issue("K-1", "instructor", None).await;

        let first = keys.redeem("K-1", "u1").await.unwrap();
        assert!(first.success);
        assert_eq!(first.new_user_type.as_deref(), Some("instructor"));

        let again = keys.redeem("K-1", "u1").await.unwrap();
        assert!(again.success);

        let other = keys.redeem("K-1", "u2").await.unwrap();
        assert!(!other.success);
        assert_eq!(other.new_user_type, None);
    }

    #[tokio::test]
    async fn expired_key_fails() {
        let keys = InMemoryActivationKeys::new();
        let past = Utc::now() - Duration::days(1);
        keys.issue("K-2", "student", Some(past)).await;

        let r = keys.redeem("K-2", "u1").await.unwrap();
        assert!(!r.success);
        assert_eq!(r.expires_at, Some(past));
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let keys = InMemoryActivationKeys::new();
        let err = keys.redeem("nope", "u1").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::NotFound(_)));
    }
}
