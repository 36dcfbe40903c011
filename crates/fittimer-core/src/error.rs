//! Core error types for fittimer-core.
//!
//! The phase engine itself cannot fail; everything here belongs to the
//! I/O-adjacent collaborators (storage, config, catalog, feedback) and to
//! input validation done by the session store.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to open the on-disk store: either the data directory or the
/// database itself.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be resolved or created
    #[error("Data directory unavailable at {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Referenced item does not exist
    #[error("No {collection} with id '{id}'")]
    NotFound { collection: String, id: String },
}

/// Set catalog errors. Messages are meant to be shown to the user as-is.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Caller is not authenticated
    #[error("Not authenticated")]
    Unauthorized,

    /// Set belongs to another user
    #[error("You do not have permission to modify set '{id}'")]
    Forbidden { id: String },

    /// Set does not exist
    #[error("Set '{id}' not found")]
    NotFound { id: String },

    /// Rejected input
    #[error("Invalid set: {0}")]
    Invalid(#[from] ValidationError),

    /// Backing store failed
    #[error("Set storage failed: {0}")]
    Storage(#[from] DatabaseError),

    /// Stored sequences could not be decoded
    #[error("Stored set is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Storage(err.into())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_messages_are_user_facing() {
        let err = CatalogError::Forbidden { id: "42".into() };
        assert_eq!(
            err.to_string(),
            "You do not have permission to modify set '42'"
        );
        assert_eq!(CatalogError::Unauthorized.to_string(), "Not authenticated");
    }

    #[test]
    fn open_failures_keep_their_source() {
        let err: CoreError = ConfigError::UnknownKey("timer.nope".into()).into();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("timer.nope"));

        let err: CoreError = DatabaseError::Locked.into();
        assert_eq!(err.to_string(), "Database error: Database is locked");
    }
}
