//! Configuration file management for syllabus.
//!
//! Provides a TOML config file at `~/.config/syllabus/config.toml` and a
//! resolution chain for the database URL: CLI flag > env var > config file >
//! default. The local settings cache lives in the same directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use syllabus_db::config::DbConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// Return the syllabus config directory: `$XDG_CONFIG_HOME/syllabus` or
/// `~/.config/syllabus`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("syllabus");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("syllabus")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Local copy of the owner's settings, read when the store is unreachable.
pub fn settings_cache_path() -> PathBuf {
    config_dir().join("settings.toml")
}

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file is readable by its owner only on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct SyllabusConfig {
    pub db_config: DbConfig,
}

impl SyllabusConfig {
    /// DB URL: `cli_db_url` > `SYLLABUS_DATABASE_URL` env >
    /// `config_file.database.url` > `DbConfig::DEFAULT_URL`. Pool sizing
    /// always comes from the environment.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let env_config = DbConfig::from_env();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("SYLLABUS_DATABASE_URL") {
            url
        } else if let Ok(cfg) = load_config() {
            cfg.database.url
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        Ok(Self {
            db_config: DbConfig {
                database_url: db_url,
                ..env_config
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{EnvGuard, lock_env};

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let _env = EnvGuard::set("SYLLABUS_DATABASE_URL", "postgresql://env:5432/envdb");

        let config = SyllabusConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        save_config(&ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
        })
        .unwrap();
        let _env = EnvGuard::set("SYLLABUS_DATABASE_URL", "postgresql://env:5432/envdb");

        let config = SyllabusConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        let _env = EnvGuard::remove("SYLLABUS_DATABASE_URL");
        save_config(&ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
        })
        .unwrap();

        let config = SyllabusConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
    }

    #[test]
    fn resolve_defaults_db_url_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        let _env = EnvGuard::remove("SYLLABUS_DATABASE_URL");

        let config = SyllabusConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());

        save_config(&ConfigFile {
            database: DatabaseSection {
                url: DbConfig::DEFAULT_URL.to_string(),
            },
        })
        .unwrap();

        let meta = std::fs::metadata(config_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn paths_live_under_syllabus_dir() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());

        assert_eq!(config_path(), tmp.path().join("syllabus").join("config.toml"));
        assert!(settings_cache_path().ends_with("syllabus/settings.toml"));
    }
}
