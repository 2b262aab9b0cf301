//! Error types for rtdb-migrate.
//!
//! Errors fall into two tiers. Loading the configuration or the snapshot is
//! fatal and aborts the run before any remote call. Everything raised while
//! migrating a single record is recorded against that record and the run
//! moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while migrating a snapshot.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The snapshot file is missing or is not valid JSON.
    #[error("Failed to load snapshot '{}': {reason}", path.display())]
    SnapshotLoad {
        /// Path that was read.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Transport-level HTTP failure (timeout, connection refused, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service rejected our credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limited by the remote service; value is the suggested wait in seconds.
    #[error("Rate limited, retry after {0}s")]
    RateLimit(u64),

    /// The identity provider refused an account or reset-link request.
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// The keyed store refused a write.
    #[error("Store error: {0}")]
    Store(String),

    /// A record has no usable `id` to key it by.
    #[error("Record in '{collection}' has no usable id")]
    MissingKey {
        /// Collection the record belongs to.
        collection: String,
    },

    /// A record key contains characters the store does not accept.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey {
        /// Offending key.
        key: String,
        /// Why the key was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_load_message_includes_path() {
        let err = Error::SnapshotLoad {
            path: PathBuf::from("/tmp/db.json"),
            reason: "No such file or directory".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/db.json"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn test_missing_key_names_collection() {
        let err = Error::MissingKey {
            collection: "chat".to_string(),
        };
        assert_eq!(err.to_string(), "Record in 'chat' has no usable id");
    }
}
