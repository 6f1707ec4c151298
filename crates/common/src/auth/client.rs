//! OAuth 2.0 client implementation with PKCE support
//!
//! Speaks to the authorization server only:
//! - Authorization URL building
//! - Authorization code exchange
//! - Token refresh
//!
//! Persistence and CSRF checks live in the exchanger, not here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::pkce::PkceChallenge;
use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse};

/// Timeout for a single token endpoint call.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuthClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// OAuth server returned a structured error
    #[error("OAuth error ({status}): {error}")]
    OAuthError { status: u16, error: OAuthError },

    /// Non-success status without a parseable error body
    #[error("Token endpoint returned status {0}")]
    Status(u16),

    /// Failed to parse response
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err.to_string())
    }
}

/// OAuth 2.0 client for a public (secretless) PKCE client
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// # Examples
    /// ```
    /// use bydefeat_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new(
    ///     "client_id",
    ///     "http://127.0.0.1:8888/callback",
    ///     vec!["streaming".to_string()],
    ///     "https://accounts.spotify.com/authorize",
    ///     "https://accounts.spotify.com/api/token",
    /// );
    /// let client = OAuthClient::new(config);
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client = Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { config, client }
    }

    /// Use a caller-provided HTTP client (shared connection pool, proxies).
    #[must_use]
    pub const fn with_http_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Build the authorization URL the browser must visit
    #[must_use]
    pub fn build_authorization_url(&self, challenge: &PkceChallenge) -> String {
        let scope = self.config.scope_string();
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("code_challenge", challenge.code_challenge.as_str()),
            ("code_challenge_method", challenge.challenge_method()),
            ("state", challenge.state.as_str()),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.config.authorize_url, query_string)
    }

    /// Exchange authorization code for tokens
    ///
    /// # Errors
    /// Returns error if the request fails, the server rejects the code, or
    /// the response cannot be parsed.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        self.post_token_form(&params).await
    }

    /// Refresh access token using refresh token
    ///
    /// # Errors
    /// Returns error if the request fails or the refresh token is rejected.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        self.post_token_form(&params).await
    }

    async fn post_token_form(
        &self,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthClientError> {
        let grant_type = params.first().map_or("", |(_, v)| *v);
        debug!(grant_type, url = %self.config.token_url, "Calling token endpoint");

        let response = self.client.post(&self.config.token_url).form(params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OAuthError>(&body) {
                Ok(error) => OAuthClientError::OAuthError { status: status.as_u16(), error },
                Err(_) => OAuthClientError::Status(status.as_u16()),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthClientError::ParseError(e.to_string()))
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub const fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    fn authorization_url(&self, challenge: &PkceChallenge) -> String {
        self.build_authorization_url(challenge)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        Self::exchange_code(self, code, code_verifier).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, OAuthClientError> {
        Self::refresh_token(self, refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::client.
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn create_test_config(token_url: &str) -> OAuthConfig {
        OAuthConfig::new(
            "test_client_id",
            "http://127.0.0.1:8888/callback",
            vec!["streaming".to_string(), "user-read-email".to_string()],
            "https://accounts.example.com/authorize",
            token_url,
        )
    }

    /// Validates `OAuthClient::build_authorization_url` behavior for the
    /// query parameter scenario.
    ///
    /// Assertions:
    /// - Ensures every required parameter is present and URL-encoded.
    #[test]
    fn test_authorization_url_parameters() {
        let client = OAuthClient::new(create_test_config("https://accounts.example.com/api/token"));
        let challenge = PkceChallenge::generate();

        let url = client.build_authorization_url(&challenge);

        assert!(url.starts_with("https://accounts.example.com/authorize?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8888%2Fcallback"));
        assert!(url.contains("scope=streaming%20user-read-email"));
        assert!(url.contains(&format!("code_challenge={}", challenge.code_challenge)));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("state={}", challenge.state)));
        assert!(!url.contains(&challenge.code_verifier));
    }

    /// Validates `OAuthClient::exchange_code` behavior for the form body
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the POST carries grant type, code and verifier.
    /// - Confirms the parsed access token.
    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .and(body_string_contains("client_id=test_client_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(&format!("{}/api/token", server.uri())));
        let response = client.exchange_code("auth-code", "the-verifier").await.unwrap();

        assert_eq!(response.access_token, "access-1");
        assert_eq!(response.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_oauth_error_body_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid refresh token"
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(&format!("{}/api/token", server.uri())));
        let err = client.refresh_token("stale").await.unwrap_err();

        match err {
            OAuthClientError::OAuthError { status, error } => {
                assert_eq!(status, 400);
                assert_eq!(error.error, "invalid_grant");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plain_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(&format!("{}/api/token", server.uri())));
        let err = client.exchange_code("c", "v").await.unwrap_err();

        assert_eq!(err, OAuthClientError::Status(503));
    }
}
