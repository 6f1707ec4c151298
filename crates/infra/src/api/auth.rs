//! Access tokens for the request gateway
//!
//! The gateway never touches the credential store directly: it asks an
//! [`AccessTokenProvider`] for a token and, after a 401, for a refreshed one.
//! [`ExchangerTokenProvider`] backs both calls with the token exchanger.

use std::sync::Arc;

use async_trait::async_trait;
use bydefeat_common::auth::TokenExchange;
use tracing::{debug, warn};

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a usable access token, refreshing expired credentials first.
    ///
    /// # Errors
    /// Returns `ApiError::AuthenticationRequired` when no token can be
    /// obtained.
    async fn access_token(&self) -> Result<String, ApiError>;

    /// Force a refresh after the server rejected the current token.
    ///
    /// # Errors
    /// Returns `ApiError::AuthenticationRequired` when the refresh fails.
    async fn refresh_access_token(&self) -> Result<String, ApiError>;
}

/// Token provider over the persisted credentials of a token exchanger
pub struct ExchangerTokenProvider {
    exchanger: Arc<dyn TokenExchange>,
}

impl ExchangerTokenProvider {
    pub fn new(exchanger: Arc<dyn TokenExchange>) -> Self {
        Self { exchanger }
    }
}

#[async_trait]
impl AccessTokenProvider for ExchangerTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        if let Some(record) = self.exchanger.valid_credentials() {
            return Ok(record.access_token);
        }

        debug!("No valid access token stored, refreshing");
        self.refresh_access_token().await
    }

    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        self.exchanger.refresh().await.map_err(|err| {
            warn!(error = %err, reason = err.label(), "Access token refresh failed");
            ApiError::AuthenticationRequired
        })
    }
}

#[cfg(test)]
mod tests {
    use bydefeat_common::auth::{CredentialRecord, CredentialStore, TokenExchanger};
    use bydefeat_common::storage::MemoryStore;
    use bydefeat_common::testing::MockOAuthClient;
    use bydefeat_common::time::MockClock;

    use super::*;

    const NOW_MS: u64 = 1_700_000_000_000;

    fn provider_with(
        record: Option<CredentialRecord>,
    ) -> (ExchangerTokenProvider, Arc<MockOAuthClient>) {
        let clock = MockClock::at_epoch_ms(NOW_MS);
        let store = Arc::new(CredentialStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
        ));
        if let Some(record) = record {
            store.save_credentials(&record).unwrap();
        }
        let oauth = Arc::new(MockOAuthClient::new());
        let exchanger = Arc::new(TokenExchanger::new(oauth.clone(), store));
        (ExchangerTokenProvider::new(exchanger), oauth)
    }

    #[tokio::test]
    async fn test_valid_token_is_returned_without_refresh() {
        let (provider, oauth) = provider_with(Some(CredentialRecord {
            access_token: "stored".into(),
            refresh_token: Some("refresh".into()),
            expires_at_epoch_ms: NOW_MS + 60_000,
        }));

        assert_eq!(provider.access_token().await.unwrap(), "stored");
        assert_eq!(oauth.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let (provider, oauth) = provider_with(Some(CredentialRecord {
            access_token: "stale".into(),
            refresh_token: Some("refresh".into()),
            expires_at_epoch_ms: NOW_MS,
        }));

        let token = provider.access_token().await.unwrap();

        assert_eq!(token, "mock-refreshed-token");
        assert_eq!(oauth.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_credentials_require_authentication() {
        let (provider, _oauth) = provider_with(None);

        let err = provider.access_token().await.unwrap_err();

        assert!(matches!(err, ApiError::AuthenticationRequired));
    }
}
