//! Per-owner workbench settings.
//!
//! Settings live in the store, keyed by owner. [`SettingsService`] keeps a
//! local TOML copy of the last settings it saw so a caller can keep working
//! with its own values while the store is unreachable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use syllabus_db::store::WorkbenchStore;

use crate::error::{WorkbenchError, WorkbenchResult};

/// Tunables injected into [`crate::Workbench`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Largest batch accepted by `batch_schedule`.
    pub max_batch_operations: usize,
    /// Whether triage views list cancelled schedules.
    pub show_cancelled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_batch_operations: 200,
            show_cancelled: true,
        }
    }
}

impl Settings {
    pub const KEYS: [&str; 2] = ["max_batch_operations", "show_cancelled"];

    pub fn validate(&self) -> WorkbenchResult<()> {
        if self.max_batch_operations == 0 {
            return Err(WorkbenchError::validation(
                "max_batch_operations must be at least 1",
            ));
        }
        Ok(())
    }

    /// Set one field from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> WorkbenchResult<()> {
        match key {
            "max_batch_operations" => {
                self.max_batch_operations = value.trim().parse().map_err(|_| {
                    WorkbenchError::validation(format!(
                        "max_batch_operations must be a positive integer, got {value:?}"
                    ))
                })?;
            }
            "show_cancelled" => {
                self.show_cancelled = value.trim().parse().map_err(|_| {
                    WorkbenchError::validation(format!(
                        "show_cancelled must be true or false, got {value:?}"
                    ))
                })?;
            }
            other => {
                return Err(WorkbenchError::validation(format!(
                    "unknown setting {other:?} (expected one of: {})",
                    Self::KEYS.join(", ")
                )));
            }
        }
        self.validate()
    }
}

/// On-disk cache format.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    owner: String,
    settings: Settings,
}

/// Loads and saves [`Settings`] for one owner at a time.
pub struct SettingsService {
    store: Arc<dyn WorkbenchStore>,
    cache_path: Option<PathBuf>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn WorkbenchStore>) -> Self {
        Self {
            store,
            cache_path: None,
        }
    }

    /// Keep a local cache at `path`.
    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// The owner's settings.
    ///
    /// Falls back to the local cache when the store fails, and to defaults
    /// when neither has anything for `owner`.
    pub async fn load(&self, owner: &str) -> Settings {
        match self.store.load_settings(owner).await {
            Ok(Some(value)) => match serde_json::from_value::<Settings>(value) {
                Ok(settings) => return settings,
                Err(e) => warn!(owner, error = %e, "stored settings unreadable, using defaults"),
            },
            Ok(None) => debug!(owner, "no stored settings, using defaults"),
            Err(e) => {
                warn!(owner, error = %e, "settings store unavailable, trying local cache");
                if let Some(cached) = self.read_cache(owner) {
                    return cached;
                }
            }
        }
        Settings::default()
    }

    /// Persist the owner's settings, then refresh the local cache.
    pub async fn save(&self, owner: &str, settings: &Settings) -> WorkbenchResult<()> {
        settings.validate()?;
        let value = serde_json::to_value(settings)
            .map_err(|e| WorkbenchError::validation(format!("unencodable settings: {e}")))?;
        self.store.save_settings(owner, &value).await?;
        self.write_cache(owner, settings);
        Ok(())
    }

    fn read_cache(&self, owner: &str) -> Option<Settings> {
        let path = self.cache_path.as_deref()?;
        match read_cache_file(path) {
            Ok(cache) if cache.owner == owner => {
                debug!(owner, path = %path.display(), "using cached settings");
                Some(cache.settings)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings cache unreadable");
                None
            }
        }
    }

    fn write_cache(&self, owner: &str, settings: &Settings) {
        let Some(path) = self.cache_path.as_deref() else {
            return;
        };
        let cache = CacheFile {
            owner: owner.to_owned(),
            settings: settings.clone(),
        };
        if let Err(e) = write_cache_file(path, &cache) {
            warn!(path = %path.display(), error = %e, "failed to refresh settings cache");
        }
    }
}

/// Failure reading or writing the local settings cache.
#[derive(Debug, Error)]
enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache is not valid TOML: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("settings could not be encoded as TOML: {0}")]
    Encode(#[from] toml::ser::Error),
}

fn read_cache_file(path: &Path) -> Result<CacheFile, CacheError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

fn write_cache_file(path: &Path, cache: &CacheFile) -> Result<(), CacheError> {
    let contents = toml::to_string_pretty(cache)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
