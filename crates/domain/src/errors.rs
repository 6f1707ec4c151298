//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the By Defeat player
///
/// Crosses the core ports: catalog, playback and gateway failures all surface
/// as one of these variants so the session layer can apply a single policy.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ByDefeatError {
    /// No usable credentials and refreshing them failed.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The granted scopes do not cover the request.
    #[error("Insufficient permissions. Please re-authenticate")]
    InsufficientPermissions,

    #[error("Request failed with status {0}")]
    RequestFailed(u16),

    /// The band catalog could not be fetched; callers fall back to the demo
    /// playlist.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ByDefeatError {
    /// Whether this error means the session can no longer be used and must be
    /// torn down.
    #[must_use]
    pub const fn forces_logout(&self) -> bool {
        matches!(self, Self::AuthenticationRequired)
    }

    /// Whether the user has to go through login again to fix this error.
    #[must_use]
    pub const fn needs_reauthentication(&self) -> bool {
        matches!(self, Self::AuthenticationRequired | Self::InsufficientPermissions)
    }
}

/// Result type alias for By Defeat operations
pub type Result<T> = std::result::Result<T, ByDefeatError>;
