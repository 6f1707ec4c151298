//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BAND_NAME, CALLBACK_TIMEOUT_SECS, DEFAULT_API_BASE_URL, DEFAULT_AUTHORIZE_URL,
    DEFAULT_CATALOG_LIMIT, DEFAULT_MARKET, DEFAULT_REDIRECT_URI, DEFAULT_SCOPES,
    DEFAULT_TOKEN_URL, HANDSHAKE_TTL_SECS, KEYCHAIN_SERVICE, REQUEST_TIMEOUT_SECS,
};
use crate::errors::{ByDefeatError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub band: BandConfig,
    pub storage: StorageConfig,
}

/// Authorization server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Public client identifier. No client secret is ever configured.
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    /// Age after which a stored PKCE handshake is refused
    pub handshake_ttl_seconds: u64,
    pub callback_timeout_seconds: u64,
}

/// Catalog API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    /// Market used for top-tracks lookups
    pub market: String,
}

/// Which artist the catalog is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    pub artist_name: String,
    pub catalog_limit: u32,
}

/// Durable storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the JSON key-value file. Defaults to the platform data
    /// directory when unset.
    pub data_dir: Option<PathBuf>,
    pub keychain_service: String,
    /// Use the platform keychain as the primary store
    pub use_keychain: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            handshake_ttl_seconds: HANDSHAKE_TTL_SECS,
            callback_timeout_seconds: CALLBACK_TIMEOUT_SECS,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: REQUEST_TIMEOUT_SECS,
            market: DEFAULT_MARKET.to_string(),
        }
    }
}

impl Default for BandConfig {
    fn default() -> Self {
        Self { artist_name: BAND_NAME.to_string(), catalog_limit: DEFAULT_CATALOG_LIMIT }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: None, keychain_service: KEYCHAIN_SERVICE.to_string(), use_keychain: true }
    }
}

impl AuthConfig {
    #[must_use]
    pub const fn handshake_ttl(&self) -> Duration {
        Duration::from_secs(self.handshake_ttl_seconds)
    }

    #[must_use]
    pub const fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_seconds)
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Config {
    /// Check the settings that have no usable default.
    ///
    /// # Errors
    /// Returns `ByDefeatError::Config` when the client id is missing, a URL is
    /// empty, or a duration is zero.
    pub fn validate(&self) -> Result<()> {
        if self.auth.client_id.trim().is_empty() {
            return Err(ByDefeatError::Config("auth.client_id must be set".to_string()));
        }
        for (name, value) in [
            ("auth.redirect_uri", &self.auth.redirect_uri),
            ("auth.authorize_url", &self.auth.authorize_url),
            ("auth.token_url", &self.auth.token_url),
            ("api.base_url", &self.api.base_url),
        ] {
            if value.trim().is_empty() {
                return Err(ByDefeatError::Config(format!("{name} must not be empty")));
            }
        }
        if self.auth.handshake_ttl_seconds == 0 || self.auth.callback_timeout_seconds == 0 {
            return Err(ByDefeatError::Config("auth timeouts must be greater than zero".into()));
        }
        if self.auth.scopes.is_empty() {
            return Err(ByDefeatError::Config("auth.scopes must not be empty".to_string()));
        }
        Ok(())
    }
}
