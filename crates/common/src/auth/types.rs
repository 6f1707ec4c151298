//! OAuth 2.0 types and structures
//!
//! The two persisted records (credentials and the PKCE handshake), the token
//! endpoint response, and the client configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::pkce::PkceChallenge;

/// Access token lifetime assumed when the server omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Persisted access credentials
///
/// Created on code exchange or refresh and read by every authenticated
/// request. Expiry is an absolute epoch timestamp so it survives restarts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: String,

    /// Absent only when the server never issued one; the exchange itself
    /// refuses responses without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    pub expires_at_epoch_ms: u64,
}

impl CredentialRecord {
    /// Build a record from a token response received at `now_ms`.
    #[must_use]
    pub fn from_response(response: &TokenResponse, now_ms: u64) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone().filter(|t| !t.is_empty()),
            expires_at_epoch_ms: now_ms.saturating_add(response.expires_in.saturating_mul(1000)),
        }
    }

    /// Whether the access token is no longer usable at `now_ms`.
    #[must_use]
    pub const fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_epoch_ms
    }

    /// Milliseconds left before expiry, zero once expired.
    #[must_use]
    pub const fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_epoch_ms.saturating_sub(now_ms)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .finish()
    }
}

/// PKCE state persisted across the authorization redirect
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRecord {
    pub code_verifier: String,
    pub csrf_state: String,
    pub created_at_epoch_ms: u64,
}

impl HandshakeRecord {
    #[must_use]
    pub fn new(challenge: &PkceChallenge, now_ms: u64) -> Self {
        Self {
            code_verifier: challenge.code_verifier.clone(),
            csrf_state: challenge.state.clone(),
            created_at_epoch_ms: now_ms,
        }
    }

    #[must_use]
    pub const fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_epoch_ms)
    }

    /// A handshake older than `ttl` must not be consumed.
    #[must_use]
    pub fn is_stale(&self, now_ms: u64, ttl: Duration) -> bool {
        u128::from(self.age_ms(now_ms)) > ttl.as_millis()
    }
}

impl fmt::Debug for HandshakeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeRecord")
            .field("code_verifier", &"<redacted>")
            .field("csrf_state", &self.csrf_state)
            .field("created_at_epoch_ms", &self.created_at_epoch_ms)
            .finish()
    }
}

/// OAuth token response from authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
}

const fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN_SECS
}

/// OAuth configuration for the authorization server
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Public OAuth client ID
    pub client_id: String,

    /// Loopback redirect URI registered with the provider
    pub redirect_uri: String,

    pub scopes: Vec<String>,

    /// Full authorization endpoint URL
    pub authorize_url: String,

    /// Full token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
        }
    }

    /// Get scopes as space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
