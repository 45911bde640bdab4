//! Connection configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How to open a [`SqliteConnection`](crate::SqliteConnection).
///
/// ```rust
/// use clasq_sqlite::SqliteConfig;
///
/// let config = SqliteConfig::from_json_str(r#"{ "busy_timeout_ms": 500 }"#).unwrap();
/// assert!(config.path.is_none());
/// assert!(config.foreign_keys);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file; in-memory when absent.
    pub path: Option<PathBuf>,
    /// How long to wait on a locked database.
    pub busy_timeout_ms: Option<u64>,
    /// Enables `PRAGMA foreign_keys`.
    pub foreign_keys: bool,
    /// Statements run right after opening.
    pub init_sql: Vec<String>,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: None,
            foreign_keys: true,
            init_sql: Vec::new(),
        }
    }
}

impl SqliteConfig {
    /// An in-memory database with default settings.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A database file with default settings.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Parses a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Config`](crate::SqliteError::Config) for
    /// malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Io`](crate::SqliteError::Io) when the file
    /// cannot be read and [`SqliteError::Config`](crate::SqliteError::Config)
    /// for malformed JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
