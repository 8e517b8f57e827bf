//! Database configuration.
//!
//! Resolves where the `SQLite` database lives from the environment. Entry
//! points load `.env` (via `dotenvy`) before calling [`DatabaseConfig::from_env`].

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Logical database name used when `CATRANK_DB_NAME` is unset.
pub const DEFAULT_DB_NAME: &str = "test-db";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CATRANK_DATA_DIR";

/// Environment variable overriding the logical database name.
pub const DB_NAME_ENV: &str = "CATRANK_DB_NAME";

/// Errors that can occur while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value was present but empty.
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// The database name contains a path separator.
    #[error("Invalid database name {0:?}: must not contain path separators")]
    InvalidDbName(String),
}

/// Location of the category database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Directory holding the database file.
    pub data_dir: PathBuf,
    /// Logical database name; the file is `<db_name>.db`.
    pub db_name: String,
}

impl DatabaseConfig {
    /// Build a config, validating the database name.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        db_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let data_dir = data_dir.into();
        let db_name = db_name.into();

        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Empty(DATA_DIR_ENV));
        }
        if db_name.trim().is_empty() {
            return Err(ConfigError::Empty(DB_NAME_ENV));
        }
        if db_name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidDbName(db_name));
        }

        Ok(Self { data_dir, db_name })
    }

    /// Resolve configuration from the environment.
    ///
    /// Resolution order for the data directory:
    /// 1. `CATRANK_DATA_DIR` environment variable
    /// 2. The system temporary directory
    ///
    /// The database name comes from `CATRANK_DB_NAME`, defaulting to
    /// [`DEFAULT_DB_NAME`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = env::var_os(DATA_DIR_ENV).map_or_else(env::temp_dir, PathBuf::from);
        let db_name = env::var(DB_NAME_ENV).unwrap_or_else(|_| DEFAULT_DB_NAME.to_string());

        let config = Self::new(data_dir, db_name)?;
        tracing::debug!(path = %config.database_path().display(), "Resolved database config");
        Ok(config)
    }

    /// Full path to the database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.db_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_uses_db_name() {
        let config = DatabaseConfig::new("/tmp/catrank", DEFAULT_DB_NAME).unwrap();
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/catrank/test-db.db")
        );
    }

    #[test]
    fn test_from_env_resolves_db_file() {
        let config = DatabaseConfig::from_env().unwrap();
        let expected = format!("{}.db", config.db_name);
        assert!(config.database_path().ends_with(expected));
    }

    #[test]
    fn test_rejects_empty_db_name() {
        let result = DatabaseConfig::new("/tmp/catrank", "  ");
        assert!(matches!(result, Err(ConfigError::Empty(DB_NAME_ENV))));
    }

    #[test]
    fn test_rejects_empty_data_dir() {
        let result = DatabaseConfig::new("", DEFAULT_DB_NAME);
        assert!(matches!(result, Err(ConfigError::Empty(DATA_DIR_ENV))));
    }

    #[test]
    fn test_rejects_path_separator_in_db_name() {
        let result = DatabaseConfig::new("/tmp/catrank", "../escape");
        assert!(matches!(result, Err(ConfigError::InvalidDbName(_))));
    }
}
