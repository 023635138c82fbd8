use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::CollaboratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

/// A time-limited URL for reading an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUrl {
    pub url: String,
    /// Seconds until `url` stops working.
    pub expires_in: u64,
}

/// Remote object storage for plan attachments.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Delete `name`. Deleting an absent object succeeds.
    async fn delete_object(&self, name: &str) -> Result<DeleteOutcome, CollaboratorError>;

    /// Sign a read URL for `name`, valid for `ttl_seconds`.
    async fn stream_url(&self, name: &str, ttl_seconds: u64)
    -> Result<StreamUrl, CollaboratorError>;
}

/// Object names held in memory; URLs point at `base_url`.
#[derive(Debug)]
pub struct InMemoryObjectStorage {
    base_url: String,
    objects: Mutex<HashSet<String>>,
}

impl InMemoryObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            objects: Mutex::new(HashSet::new()),
        }
    }

    pub async fn put(&self, name: impl Into<String>) {
        self.objects.lock().await.insert(name.into());
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.objects.lock().await.contains(name)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn delete_object(&self, name: &str) -> Result<DeleteOutcome, CollaboratorError> {
        self.objects.lock().await.remove(name);
        Ok(DeleteOutcome { success: true })
    }

    async fn stream_url(
        &self,
        name: &str,
        ttl_seconds: u64,
    ) -> Result<StreamUrl, CollaboratorError> {
        if ttl_seconds == 0 {
            return Err(CollaboratorError::Rejected(
                "ttl_seconds must be positive".to_owned(),
            ));
        }
        if !self.objects.lock().await.contains(name) {
            return Err(CollaboratorError::NotFound(format!("object {name:?}")));
        }
        Ok(StreamUrl {
            url: format!("{}/{name}?expires_in={ttl_seconds}", self.base_url),
            expires_in: ttl_seconds,
        })
    }
}
