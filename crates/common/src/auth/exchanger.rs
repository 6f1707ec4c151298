//! Token exchanger
//!
//! Owns the token lifecycle:
//! - Starting a login (handshake persisted before the redirect)
//! - Exchanging the returned authorization code, at most once per code
//! - Refreshing the access token, one refresh at a time
//! - Clearing every record on logout
//!
//! The process that handles the redirect only trusts what the credential
//! store holds; nothing from the login start is kept in memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::pkce::{validate_state, PkceChallenge};
use super::store::CredentialStore;
use super::traits::{OAuthClientTrait, TokenExchange};
use super::types::{CredentialRecord, HandshakeRecord};

/// Default handshake lifetime (10 minutes).
pub const DEFAULT_HANDSHAKE_TTL: Duration = Duration::from_secs(10 * 60);

type ExchangeResult = Result<CredentialRecord, AuthError>;
type InFlightExchange = Shared<BoxFuture<'static, ExchangeResult>>;
type RefreshResult = Result<String, AuthError>;
type InFlightRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Exchanges authorization codes and refreshes tokens
///
/// Concurrent exchanges of the same code share one in-flight request: the
/// authorization server accepts a code once, so a second POST would always
/// fail. Refreshes are shared the same way, since a server that rotates
/// refresh tokens rejects the second use of the old one.
pub struct TokenExchanger<C> {
    client: Arc<C>,
    store: Arc<CredentialStore>,
    handshake_ttl: Duration,
    in_flight: Arc<Mutex<HashMap<String, InFlightExchange>>>,
    refreshing: Arc<Mutex<Option<InFlightRefresh>>>,
}

impl<C> TokenExchanger<C>
where
    C: OAuthClientTrait + 'static,
{
    pub fn new(client: Arc<C>, store: Arc<CredentialStore>) -> Self {
        Self {
            client,
            store,
            handshake_ttl: DEFAULT_HANDSHAKE_TTL,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            refreshing: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub const fn with_handshake_ttl(mut self, ttl: Duration) -> Self {
        self.handshake_ttl = ttl;
        self
    }

    /// The store this exchanger reads and writes.
    #[must_use]
    pub const fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Number of exchanges currently running.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Persist a new handshake and return the authorization URL.
    ///
    /// Replaces any previous handshake, so only one login is active at a
    /// time.
    ///
    /// # Errors
    /// Returns `AuthError::StorageUnavailable` if neither store accepts the
    /// handshake.
    pub fn start_login(&self) -> Result<String, AuthError> {
        let challenge = PkceChallenge::generate();
        let record = HandshakeRecord::new(&challenge, self.store.now_ms());
        self.store.save_handshake(&record)?;

        info!("Generated authorization URL");
        Ok(self.client.authorization_url(&challenge))
    }

    /// Exchange an authorization code for credentials.
    ///
    /// Callers racing on the same `code` await one shared exchange and get
    /// the same result.
    ///
    /// # Errors
    /// - `HandshakeMissing` when no login was started
    /// - `HandshakeExpired` when the handshake is older than the TTL (the
    ///   handshake is deleted)
    /// - `StateMismatch` when `redirect_state` differs from the stored state
    ///   (the handshake is kept)
    /// - `ExchangeFailed` for any rejected or incomplete token response (the
    ///   handshake is kept)
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_state: Option<&str>,
    ) -> ExchangeResult {
        let exchange = {
            let mut in_flight = self.in_flight.lock();
            if let Some(existing) = in_flight.get(code) {
                debug!("Joining in-flight code exchange");
                existing.clone()
            } else {
                let exchange = self.spawn_exchange(code, redirect_state);
                in_flight.insert(code.to_string(), exchange.clone());
                exchange
            }
        };

        exchange.await
    }

    fn spawn_exchange(&self, code: &str, redirect_state: Option<&str>) -> InFlightExchange {
        let client = Arc::clone(&self.client);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.in_flight);
        let ttl = self.handshake_ttl;
        let code = code.to_string();
        let redirect_state = redirect_state.map(ToString::to_string);

        async move {
            let result =
                run_exchange(client.as_ref(), &store, ttl, &code, redirect_state.as_deref()).await;
            registry.lock().remove(&code);
            result
        }
        .boxed()
        .shared()
    }

    /// Refresh the access token.
    ///
    /// Stores the new access token, keeping the previous refresh token
    /// unless the server rotated it. Callers arriving while a refresh runs
    /// await that refresh instead of starting another.
    ///
    /// # Errors
    /// - `NoRefreshToken` when nothing is stored
    /// - `RefreshFailed` when the server rejects the refresh or the new
    ///   credentials cannot be stored; the old credentials stay in place
    pub async fn refresh(&self) -> RefreshResult {
        let refresh = {
            let mut refreshing = self.refreshing.lock();
            if let Some(existing) = refreshing.as_ref() {
                debug!("Joining in-flight token refresh");
                existing.clone()
            } else {
                let refresh = self.spawn_refresh();
                *refreshing = Some(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    fn spawn_refresh(&self) -> InFlightRefresh {
        let client = Arc::clone(&self.client);
        let store = Arc::clone(&self.store);
        let slot = Arc::clone(&self.refreshing);

        async move {
            let result = run_refresh(client.as_ref(), &store).await;
            slot.lock().take();
            result
        }
        .boxed()
        .shared()
    }

    /// Whether a refresh is currently running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.lock().is_some()
    }

    /// Stored credentials that have not expired yet.
    #[must_use]
    pub fn valid_credentials(&self) -> Option<CredentialRecord> {
        self.store.load_credentials()
    }

    /// Drop the pending login without using it.
    pub fn abandon_login(&self) {
        self.store.clear_handshake();
        debug!("Login handshake discarded");
    }

    /// Forget every persisted record.
    pub fn logout(&self) {
        self.store.clear_all();
        info!("Credentials cleared (logged out)");
    }
}

async fn run_refresh<C: OAuthClientTrait + ?Sized>(
    client: &C,
    store: &CredentialStore,
) -> RefreshResult {
    let refresh_token = store.load_refresh_token().ok_or(AuthError::NoRefreshToken)?;

    let response = client.refresh_token(&refresh_token).await.map_err(|e| {
        warn!(error = %e, "Token refresh rejected");
        AuthError::RefreshFailed(e.to_string())
    })?;
    if response.access_token.is_empty() {
        return Err(AuthError::RefreshFailed("response missing access_token".to_string()));
    }

    let now = store.now_ms();
    let mut record = CredentialRecord::from_response(&response, now);
    if record.refresh_token.is_none() {
        record.refresh_token = Some(refresh_token);
    }
    store.save_credentials(&record).map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

    info!(expires_in_ms = record.remaining_ms(now), "Successfully refreshed access token");
    Ok(record.access_token)
}

async fn run_exchange<C: OAuthClientTrait + ?Sized>(
    client: &C,
    store: &CredentialStore,
    ttl: Duration,
    code: &str,
    redirect_state: Option<&str>,
) -> ExchangeResult {
    let handshake = store.load_handshake().ok_or_else(|| {
        warn!("Authorization code received without a stored handshake");
        AuthError::HandshakeMissing
    })?;

    let now = store.now_ms();
    if handshake.is_stale(now, ttl) {
        warn!(age_ms = handshake.age_ms(now), "Login handshake expired");
        store.clear_handshake();
        return Err(AuthError::HandshakeExpired);
    }

    if let Some(state) = redirect_state {
        if !validate_state(&handshake.csrf_state, state) {
            warn!("Authorization state mismatch");
            return Err(AuthError::StateMismatch);
        }
    }

    let response = client.exchange_code(code, &handshake.code_verifier).await.map_err(|e| {
        warn!(error = %e, "Authorization code exchange rejected");
        AuthError::ExchangeFailed(e.to_string())
    })?;

    if response.access_token.is_empty() {
        return Err(AuthError::ExchangeFailed("response missing access_token".to_string()));
    }
    if response.refresh_token.as_deref().map_or(true, str::is_empty) {
        return Err(AuthError::ExchangeFailed("response missing refresh_token".to_string()));
    }

    let record = CredentialRecord::from_response(&response, store.now_ms());
    store.save_credentials(&record)?;
    store.clear_handshake();

    info!(expires_at_ms = record.expires_at_epoch_ms, "Authorization code exchanged");
    Ok(record)
}

#[async_trait]
impl<C> TokenExchange for TokenExchanger<C>
where
    C: OAuthClientTrait + 'static,
{
    fn start_login(&self) -> Result<String, AuthError> {
        Self::start_login(self)
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_state: Option<&str>,
    ) -> ExchangeResult {
        Self::exchange_authorization_code(self, code, redirect_state).await
    }

    async fn refresh(&self) -> RefreshResult {
        Self::refresh(self).await
    }

    fn valid_credentials(&self) -> Option<CredentialRecord> {
        Self::valid_credentials(self)
    }

    fn save_credentials(&self, record: &CredentialRecord) -> Result<(), AuthError> {
        if self.store.load_credentials().as_ref() == Some(record) {
            return Ok(());
        }
        self.store.save_credentials(record)
    }

    fn clear_credentials(&self) {
        self.store.clear_credentials();
    }

    fn abandon_login(&self) {
        Self::abandon_login(self);
    }

    fn logout(&self) {
        Self::logout(self);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::exchanger.
    use super::*;
    use crate::auth::client::OAuthClientError;
    use crate::auth::store::keys;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::testing::mocks::MockOAuthClient;
    use crate::time::{Clock, MockClock};

    struct Fixture {
        client: Arc<MockOAuthClient>,
        primary: Arc<MemoryStore>,
        clock: MockClock,
        exchanger: TokenExchanger<MockOAuthClient>,
    }

    fn fixture() -> Fixture {
        let client = Arc::new(MockOAuthClient::new());
        let primary = Arc::new(MemoryStore::with_name("primary"));
        let clock = MockClock::at_epoch_ms(1_700_000_000_000);
        let store = Arc::new(CredentialStore::new(
            primary.clone(),
            Arc::new(MemoryStore::with_name("secondary")),
            Arc::new(clock.clone()),
        ));
        let exchanger = TokenExchanger::new(client.clone(), store);
        Fixture { client, primary, clock, exchanger }
    }

    fn seed_handshake(f: &Fixture, state: &str, created_at: u64) {
        f.exchanger
            .store()
            .save_handshake(&HandshakeRecord {
                code_verifier: "verifier-0123456789-0123456789-0123456789".into(),
                csrf_state: state.into(),
                created_at_epoch_ms: created_at,
            })
            .unwrap();
    }

    /// Validates `TokenExchanger::exchange_authorization_code` behavior for
    /// the state mismatch scenario.
    ///
    /// Assertions:
    /// - Ensures stored state "abc" vs redirect state "xyz" fails with
    ///   `StateMismatch`.
    /// - Ensures the handshake remains present and no POST was made.
    #[tokio::test]
    async fn test_state_mismatch_keeps_handshake() {
        let f = fixture();
        seed_handshake(&f, "abc", f.clock.millis_since_epoch());

        let result = f.exchanger.exchange_authorization_code("code", Some("xyz")).await;

        assert_eq!(result, Err(AuthError::StateMismatch));
        assert!(f.exchanger.store().load_handshake().is_some());
        assert_eq!(f.client.exchange_calls(), 0);
    }

    /// Validates `TokenExchanger::exchange_authorization_code` behavior for
    /// the stale handshake scenario.
    ///
    /// Assertions:
    /// - Ensures a handshake created 700 000 ms ago fails with
    ///   `HandshakeExpired`.
    /// - Ensures the stale handshake is deleted.
    #[tokio::test]
    async fn test_stale_handshake_is_rejected_and_cleared() {
        let f = fixture();
        let now = f.clock.millis_since_epoch();
        seed_handshake(&f, "abc", now - 700_000);

        let result = f.exchanger.exchange_authorization_code("code", Some("abc")).await;

        assert_eq!(result, Err(AuthError::HandshakeExpired));
        assert!(f.exchanger.store().load_handshake().is_none());
        assert_eq!(f.client.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_handshake() {
        let f = fixture();
        let result = f.exchanger.exchange_authorization_code("code", None).await;
        assert_eq!(result, Err(AuthError::HandshakeMissing));
    }

    /// Validates `TokenExchanger::exchange_authorization_code` behavior for
    /// the success scenario.
    ///
    /// Assertions:
    /// - Ensures credentials are persisted and the handshake is cleared.
    /// - Confirms the verifier from the handshake was sent.
    #[tokio::test]
    async fn test_successful_exchange_persists_credentials() {
        let f = fixture();
        seed_handshake(&f, "abc", f.clock.millis_since_epoch());

        let record = f.exchanger.exchange_authorization_code("code", Some("abc")).await.unwrap();

        assert_eq!(record.access_token, "mock-access-token");
        assert_eq!(f.exchanger.valid_credentials(), Some(record));
        assert!(f.exchanger.store().load_handshake().is_none());
        assert_eq!(
            f.client.last_code_verifier().as_deref(),
            Some("verifier-0123456789-0123456789-0123456789")
        );
        assert_eq!(f.exchanger.in_flight_count(), 0);
    }

    /// Validates `TokenExchanger::exchange_authorization_code` behavior for
    /// the server rejection scenario.
    ///
    /// Assertions:
    /// - Ensures the error is `ExchangeFailed`.
    /// - Ensures the handshake survives so the user may retry.
    #[tokio::test]
    async fn test_failed_exchange_keeps_handshake() {
        let f = fixture();
        seed_handshake(&f, "abc", f.clock.millis_since_epoch());
        f.client.fail_exchange_with(OAuthClientError::Status(500));

        let result = f.exchanger.exchange_authorization_code("code", Some("abc")).await;

        assert!(matches!(result, Err(AuthError::ExchangeFailed(_))));
        assert!(f.exchanger.store().load_handshake().is_some());
        assert!(f.exchanger.valid_credentials().is_none());
    }

    #[tokio::test]
    async fn test_exchange_without_refresh_token_fails() {
        let f = fixture();
        seed_handshake(&f, "abc", f.clock.millis_since_epoch());
        f.client.set_exchange_refresh_token(None);

        let result = f.exchanger.exchange_authorization_code("code", Some("abc")).await;

        assert!(matches!(result, Err(AuthError::ExchangeFailed(_))));
        assert!(f.exchanger.store().load_handshake().is_some());
    }

    /// Validates `TokenExchanger::exchange_authorization_code` behavior for
    /// the concurrent duplicate scenario.
    ///
    /// Assertions:
    /// - Ensures two concurrent calls with one code reach the server once.
    /// - Confirms both callers receive the same record.
    #[tokio::test]
    async fn test_concurrent_exchanges_share_one_request() {
        let f = fixture();
        seed_handshake(&f, "abc", f.clock.millis_since_epoch());
        f.client.set_delay(Duration::from_millis(50));

        let (first, second) = tokio::join!(
            f.exchanger.exchange_authorization_code("same-code", Some("abc")),
            f.exchanger.exchange_authorization_code("same-code", Some("abc")),
        );

        assert_eq!(f.client.exchange_calls(), 1);
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(f.exchanger.in_flight_count(), 0);
    }

    /// Validates `TokenExchanger::refresh` behavior for concurrent callers.
    ///
    /// Assertions:
    /// - Ensures two concurrent refreshes reach the server once, so a
    ///   rotated refresh token is never presented twice.
    /// - Confirms both callers receive the same access token.
    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_request() {
        let f = fixture();
        f.primary.set(keys::CREDENTIALS_REFRESH_TOKEN, "first").unwrap();
        f.client.set_refresh_rotation(Some("second"));
        f.client.set_delay(Duration::from_millis(50));

        let (first, second) = tokio::join!(f.exchanger.refresh(), f.exchanger.refresh());

        assert_eq!(f.client.refresh_calls(), 1);
        assert_eq!(first.unwrap(), second.unwrap());
        assert!(!f.exchanger.is_refreshing());
        assert_eq!(f.exchanger.store().load_refresh_token().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_reach_the_server() {
        let f = fixture();
        f.primary.set(keys::CREDENTIALS_REFRESH_TOKEN, "first").unwrap();

        f.exchanger.refresh().await.unwrap();
        f.exchanger.refresh().await.unwrap();

        assert_eq!(f.client.refresh_calls(), 2);
    }

    /// Validates `TokenExchanger::refresh` behavior after expiry.
    ///
    /// Assertions:
    /// - Ensures an expired record can still be refreshed.
    /// - Ensures the old refresh token is kept when none is rotated in.
    #[tokio::test]
    async fn test_refresh_after_expiry_keeps_refresh_token() {
        let f = fixture();
        let now = f.clock.millis_since_epoch();
        f.exchanger
            .store()
            .save_credentials(&CredentialRecord {
                access_token: "old".into(),
                refresh_token: Some("keep-me".into()),
                expires_at_epoch_ms: now + 1_000,
            })
            .unwrap();
        f.clock.advance(Duration::from_secs(5));
        assert!(f.exchanger.valid_credentials().is_none());
        f.client.set_refresh_rotation(None);

        let token = f.exchanger.refresh().await.unwrap();

        assert_eq!(token, "mock-refreshed-token");
        assert_eq!(f.client.last_refresh_token().as_deref(), Some("keep-me"));
        let record = f.exchanger.valid_credentials().unwrap();
        assert_eq!(record.refresh_token.as_deref(), Some("keep-me"));
    }

    #[tokio::test]
    async fn test_refresh_stores_rotated_token() {
        let f = fixture();
        f.primary.set(keys::CREDENTIALS_REFRESH_TOKEN, "first").unwrap();
        f.client.set_refresh_rotation(Some("second"));

        f.exchanger.refresh().await.unwrap();

        assert_eq!(f.exchanger.store().load_refresh_token().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_refresh_without_token() {
        let f = fixture();
        assert_eq!(f.exchanger.refresh().await, Err(AuthError::NoRefreshToken));
        assert_eq!(f.client.refresh_calls(), 0);
    }

    /// Validates `TokenExchanger::refresh` behavior for the rejected refresh
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the error is `RefreshFailed`.
    /// - Ensures the previous credentials are untouched.
    #[tokio::test]
    async fn test_refresh_failure_keeps_old_credentials() {
        let f = fixture();
        let old = CredentialRecord {
            access_token: "old".into(),
            refresh_token: Some("r".into()),
            expires_at_epoch_ms: f.clock.millis_since_epoch() + 60_000,
        };
        f.exchanger.store().save_credentials(&old).unwrap();
        f.client.fail_refresh_with(OAuthClientError::Status(400));

        let result = f.exchanger.refresh().await;

        assert!(matches!(result, Err(AuthError::RefreshFailed(_))));
        assert_eq!(f.exchanger.valid_credentials(), Some(old));
    }

    #[tokio::test]
    async fn test_start_login_persists_handshake() {
        let f = fixture();

        let url = f.exchanger.start_login().unwrap();
        let handshake = f.exchanger.store().load_handshake().unwrap();

        assert!(url.contains(&format!("state={}", handshake.csrf_state)));
        assert_eq!(handshake.created_at_epoch_ms, f.clock.millis_since_epoch());
        assert!(f.exchanger.store().load_handshake().is_some());
    }

    #[tokio::test]
    async fn test_abandon_login_keeps_credentials() {
        let f = fixture();
        f.primary.set(keys::CREDENTIALS_REFRESH_TOKEN, "r").unwrap();
        f.exchanger.start_login().unwrap();

        f.exchanger.abandon_login();

        assert!(f.exchanger.store().load_handshake().is_none());
        assert_eq!(f.exchanger.store().load_refresh_token().as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let f = fixture();
        f.exchanger.start_login().unwrap();
        f.primary.set(keys::CREDENTIALS_ACCESS_TOKEN, "a").unwrap();

        f.exchanger.logout();

        assert!(f.primary.is_empty());
        assert!(f.exchanger.store().load_handshake().is_none());
    }
}
