//! Errors raised while opening and configuring SQLite connections.

use thiserror::Error;

/// SQLite driver error.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Failure reported by SQLite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Failure reading a configuration file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SqliteError> for clasq_core::Error {
    fn from(err: SqliteError) -> Self {
        Self::driver(err)
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, SqliteError>;
