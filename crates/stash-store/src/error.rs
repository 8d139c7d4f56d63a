//! Error types for storage operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by storage backends, providers, and key validation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key is not usable as a storage slot name.
    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The write would push the backend past its quota.
    #[error("quota exceeded writing {key:?}: {required} bytes required, quota is {quota}")]
    QuotaExceeded {
        key: String,
        required: u64,
        quota: u64,
    },

    /// The backend refuses mutation (read-only or permission denied).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// No backend is available yet (e.g. before first use, or outside a page).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A value could not be serialized to or parsed from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A persisted storage file exists but cannot be decoded.
    #[error("corrupt storage file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
