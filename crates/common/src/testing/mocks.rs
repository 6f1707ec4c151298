//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[cfg(feature = "platform")]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(feature = "platform")]
use std::time::Duration;

#[cfg(feature = "platform")]
use async_trait::async_trait;
#[cfg(feature = "platform")]
use parking_lot::Mutex;

#[cfg(feature = "platform")]
use crate::auth::{OAuthClientError, OAuthClientTrait, PkceChallenge, TokenResponse};
use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Store whose backend is never reachable
///
/// Stands in for a locked keychain or a read-only data directory.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    name: String,
}

impl UnavailableStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn error(&self) -> StorageError {
        StorageError::Unavailable(format!("{} is unavailable", self.name))
    }
}

impl Default for UnavailableStore {
    fn default() -> Self {
        Self::new("unavailable")
    }
}

impl KeyValueStore for UnavailableStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(self.error())
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(self.error())
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(self.error())
    }
}

#[cfg(feature = "platform")]
#[derive(Debug)]
struct MockOAuthState {
    exchange_error: Option<OAuthClientError>,
    refresh_error: Option<OAuthClientError>,
    exchange_refresh_token: Option<String>,
    refresh_rotation: Option<String>,
    delay: Option<Duration>,
    last_code_verifier: Option<String>,
    last_refresh_token: Option<String>,
}

/// Mock OAuth client for testing the exchanger without a token endpoint
///
/// Successful exchanges return `mock-access-token` / `mock-refresh-token`;
/// successful refreshes return `mock-refreshed-token`. Both expire in one
/// hour.
#[cfg(feature = "platform")]
#[derive(Debug)]
pub struct MockOAuthClient {
    state: Mutex<MockOAuthState>,
    exchange_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

#[cfg(feature = "platform")]
impl MockOAuthClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockOAuthState {
                exchange_error: None,
                refresh_error: None,
                exchange_refresh_token: Some("mock-refresh-token".to_string()),
                refresh_rotation: None,
                delay: None,
                last_code_verifier: None,
                last_refresh_token: None,
            }),
            exchange_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_exchange_with(&self, error: OAuthClientError) {
        self.state.lock().exchange_error = Some(error);
    }

    pub fn fail_refresh_with(&self, error: OAuthClientError) {
        self.state.lock().refresh_error = Some(error);
    }

    /// Refresh token returned by a successful exchange (`None` omits it).
    pub fn set_exchange_refresh_token(&self, token: Option<&str>) {
        self.state.lock().exchange_refresh_token = token.map(ToString::to_string);
    }

    /// Rotated refresh token returned by a successful refresh.
    pub fn set_refresh_rotation(&self, token: Option<&str>) {
        self.state.lock().refresh_rotation = token.map(ToString::to_string);
    }

    /// Delay every response, to widen race windows.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn last_code_verifier(&self) -> Option<String> {
        self.state.lock().last_code_verifier.clone()
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.state.lock().last_refresh_token.clone()
    }

    fn delay(&self) -> Option<Duration> {
        self.state.lock().delay
    }
}

#[cfg(feature = "platform")]
impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "platform")]
fn token_response(access_token: &str, refresh_token: Option<String>) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        refresh_token,
        token_type: Some("Bearer".to_string()),
        expires_in: 3600,
        scope: None,
    }
}

#[cfg(feature = "platform")]
#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    fn authorization_url(&self, challenge: &PkceChallenge) -> String {
        format!(
            "https://accounts.example.com/authorize?code_challenge={}&state={}",
            challenge.code_challenge, challenge.state
        )
    }

    async fn exchange_code(
        &self,
        _code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.last_code_verifier = Some(code_verifier.to_string());
        if let Some(error) = state.exchange_error.clone() {
            return Err(error);
        }
        Ok(token_response("mock-access-token", state.exchange_refresh_token.clone()))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.last_refresh_token = Some(refresh_token.to_string());
        if let Some(error) = state.refresh_error.clone() {
            return Err(error);
        }
        Ok(token_response("mock-refreshed-token", state.refresh_rotation.clone()))
    }
}
