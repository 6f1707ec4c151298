//! Storage error types

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached at all (locked keychain, no session bus,
    /// read-only directory).
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Invalid value stored under {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Build an [`StorageError::InvalidValue`] for `key`.
    pub fn invalid_value(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidValue { key: key.into(), reason: reason.to_string() }
    }
}
