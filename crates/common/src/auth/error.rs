//! Authentication error taxonomy
//!
//! `Clone` is required: concurrent callers of one code exchange share a
//! single result.

use thiserror::Error;

/// Errors raised by the credential store and token exchanger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Neither the primary nor the secondary store accepted the write.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A callback arrived but no login was started from this device.
    #[error("No login in progress")]
    HandshakeMissing,

    #[error("Login expired, please start again")]
    HandshakeExpired,

    /// The redirect carried a state this client did not issue.
    #[error("Authorization state mismatch")]
    StateMismatch,

    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}

impl AuthError {
    /// Whether the stored handshake is still usable after this error, so the
    /// same callback may be retried.
    #[must_use]
    pub const fn handshake_retained(&self) -> bool {
        matches!(self, Self::StateMismatch | Self::ExchangeFailed(_) | Self::StorageUnavailable(_))
    }

    /// Stable label for log fields.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::HandshakeMissing => "handshake_missing",
            Self::HandshakeExpired => "handshake_expired",
            Self::StateMismatch => "state_mismatch",
            Self::ExchangeFailed(_) => "exchange_failed",
            Self::NoRefreshToken => "no_refresh_token",
            Self::RefreshFailed(_) => "refresh_failed",
        }
    }
}
