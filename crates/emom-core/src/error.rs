//! Core error types for emom-core.
//!
//! This module defines the error hierarchy using thiserror. Only
//! `InvalidConfiguration` is meant to stop a caller; persistence failures are
//! logged and swallowed by the ledger, and unknown session ids are ignored.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::SessionOutcome;

/// Core error type for emom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings that cannot drive a session (zero work time, zero rounds).
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfiguration { field: String, message: String },

    /// Ledger lookup for a session that was never started or already removed.
    #[error("Unknown workout session: {0}")]
    UnknownSessionId(String),

    /// Control issued after the session reached a terminal outcome.
    #[error("Session already ended ({0:?})")]
    SessionEnded(SessionOutcome),

    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        CoreError::InvalidConfiguration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Blob could not be encoded or decoded
    #[error("Failed to encode or decode '{key}': {message}")]
    Codec { key: String, message: String },

    /// Store refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    PersistenceError::Locked
                } else {
                    PersistenceError::QueryFailed(err.to_string())
                }
            }
            _ => PersistenceError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Persistence(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_names_field() {
        let err = CoreError::invalid("work_interval_seconds", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'work_interval_seconds': must be greater than zero"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: CoreError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(err, CoreError::Io(_)));
        assert_eq!(err.to_string(), "IO error: read-only");
    }

    #[test]
    fn sqlite_busy_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(PersistenceError::from(err), PersistenceError::Locked));
    }
}
