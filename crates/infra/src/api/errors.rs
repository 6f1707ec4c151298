//! Gateway error types
//!
//! Classifies failures of authenticated catalog requests. Every variant maps
//! onto one [`ByDefeatError`] so the session layer applies a single policy.

use std::time::Duration;

use bydefeat_domain::ByDefeatError;
use thiserror::Error;

/// Categories of gateway errors, logged with every failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// No usable token (401 after refresh, refresh failed)
    Authentication,
    /// Token lacks the scope for this request (403)
    Permission,
    /// Any other non-2xx status
    Status,
    /// Connection failures and timeouts
    Network,
    /// Body could not be decoded into the expected shape
    Decode,
    /// Client construction problems
    Config,
}

/// Gateway operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("{path} returned status {status}")]
    Status { status: u16, path: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub const fn category(&self) -> ApiErrorCategory {
        match self {
            Self::AuthenticationRequired => ApiErrorCategory::Authentication,
            Self::InsufficientPermissions => ApiErrorCategory::Permission,
            Self::Status { .. } => ApiErrorCategory::Status,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// HTTP status behind this error, if the server answered at all.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationRequired => Some(401),
            Self::InsufficientPermissions => Some(403),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/* ApiError → ByDefeatError */
impl From<ApiError> for ByDefeatError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthenticationRequired => Self::AuthenticationRequired,
            ApiError::InsufficientPermissions => Self::InsufficientPermissions,
            ApiError::Status { status, .. } => Self::RequestFailed(status),
            ApiError::Network(message) => Self::Network(message),
            ApiError::Timeout(after) => Self::Network(format!("request timed out after {after:?}")),
            ApiError::Decode(message) => Self::Decode(message),
            ApiError::Config(message) => Self::Config(message),
        }
    }
}
