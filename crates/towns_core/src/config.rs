//! Runtime configuration for embedding the town registry.
//!
//! # Responsibility
//! - Describe where town data lives and how logging is set up.
//! - Resolve settings from `TOWNS_*` environment variables.
//!
//! # Invariants
//! - A missing `db_path` means an in-memory database.
//! - A missing `log_dir` means logging stays uninitialized.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging};
use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TOWNS_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "TOWNS_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TOWNS_LOG_DIR";

/// Settings needed to stand up a registry process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file backing the store.
    pub db_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            db_path: read(DB_PATH_ENV).map(PathBuf::from),
            log_level: read(LOG_LEVEL_ENV),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    /// Returns the configured level, falling back to the build default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Starts logging when a directory is configured.
    ///
    /// Returns `Ok(false)` when no `log_dir` is set.
    pub fn init_logging(&self) -> Result<bool, String> {
        match &self.log_dir {
            Some(dir) => init_logging(self.effective_log_level(), dir).map(|()| true),
            None => Ok(false),
        }
    }

    /// Opens the configured database with migrations applied.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DB_PATH_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn lookup_ignores_blank_values() {
        let vars = HashMap::from([
            (DB_PATH_ENV, "/tmp/towns.sqlite3".to_string()),
            (LOG_LEVEL_ENV, "   ".to_string()),
        ]);
        let config = CoreConfig::from_lookup(|key| vars.get(key).cloned());

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/towns.sqlite3")));
        assert_eq!(config.log_level, None);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: CoreConfig = serde_json::from_str(r#"{ "log_level": "warn" }"#).unwrap();

        assert_eq!(config.effective_log_level(), "warn");
        assert_eq!(config.db_path, None);
    }

    #[test]
    fn default_config_uses_memory_and_no_logging() {
        let config = CoreConfig::default();

        assert!(!config.init_logging().unwrap());
        assert!(config.open_connection().is_ok());
        assert!(!config.effective_log_level().is_empty());
    }
}
