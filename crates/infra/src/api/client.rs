//! Authenticated request gateway
//!
//! Every catalog and playback call goes through [`ApiClient::request`]:
//! attach the bearer token, and on a 401 refresh once and retry once. There
//! is no backoff and no request queue.

use std::sync::Arc;
use std::time::Duration;

use bydefeat_domain::constants::{DEFAULT_API_BASE_URL, REQUEST_TIMEOUT_SECS};
use bydefeat_domain::ApiConfig;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::auth::AccessTokenProvider;
use super::errors::ApiError;

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://api.spotify.com/v1")
    pub base_url: String,
    /// Timeout for each HTTP attempt
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        }
    }
}

/// Gateway for authenticated catalog API requests
pub struct ApiClient {
    http: reqwest::Client,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(
        config: ApiClientConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, auth, config })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    /// Execute a PUT request with an optional JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn put<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ApiError> {
        let body = body.map(Self::encode_body).transpose()?;
        self.request(Method::PUT, path, body.as_ref()).await
    }

    /// Execute a POST request with an optional JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ApiError> {
        let body = body.map(Self::encode_body).transpose()?;
        self.request(Method::POST, path, body.as_ref()).await
    }

    /// Send an authenticated request and decode the JSON response
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` if no token can be obtained, the refresh
    ///   after a 401 fails, or the retried request is rejected again
    /// - `InsufficientPermissions` on 403
    /// - `Status` on any other non-2xx response
    /// - `Network`/`Timeout` on transport failures, `Decode` on bad bodies
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        match self.execute(method, path, body).await {
            Ok(result) => {
                info!("Request successful");
                Ok(result)
            }
            Err(err) => {
                warn!(
                    category = ?err.category(),
                    status = ?err.status(),
                    error = %err,
                    "Request failed"
                );
                Err(err)
            }
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let token = self.auth.access_token().await?;
        let mut response = self.send(method.clone(), path, body, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Access token rejected, refreshing once");
            let token = self.auth.refresh_access_token().await?;
            response = self.send(method, path, body, &token).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                debug!("Request rejected after token refresh");
                return Err(ApiError::AuthenticationRequired);
            }
        }

        Self::decode(response, path).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: &str,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.config.base_url, path);
        let bodyless_write = body.is_none() && method != Method::GET;
        let mut request = self.http.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        } else if bodyless_write {
            // The player endpoints answer 411 without an explicit length.
            request = request.header(reqwest::header::CONTENT_LENGTH, 0);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.config.timeout)
            } else {
                ApiError::Network(e.to_string())
            }
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(ApiError::InsufficientPermissions);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Non-success response body");
            return Err(ApiError::Status { status: status.as_u16(), path: path.to_string() });
        }

        // 204/205 carry no body; several player endpoints also answer 200
        // or 202 with an empty one.
        let bytes = if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            Default::default()
        } else {
            response.bytes().await?
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ApiError::Decode(format!(
                    "empty response ({}) where a body was expected",
                    status.as_u16()
                ))
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn encode_body<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("Failed to serialize body: {e}")))
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the authentication provider
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let auth =
            self.auth.ok_or_else(|| ApiError::Config("Auth provider not set".to_string()))?;

        ApiClient::new(config, auth)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Provider that hands out `old-token` until refreshed, then `new-token`
    #[derive(Default)]
    struct RefreshingAuthProvider {
        refreshes: AtomicUsize,
        refresh_fails: bool,
    }

    impl RefreshingAuthProvider {
        fn failing_refresh() -> Self {
            Self { refresh_fails: true, ..Self::default() }
        }

        fn refreshes(&self) -> usize {
            self.refreshes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AccessTokenProvider for RefreshingAuthProvider {
        async fn access_token(&self) -> Result<String, ApiError> {
            if self.refreshes() == 0 {
                Ok("old-token".to_string())
            } else {
                Ok("new-token".to_string())
            }
        }

        async fn refresh_access_token(&self) -> Result<String, ApiError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.refresh_fails {
                return Err(ApiError::AuthenticationRequired);
            }
            Ok("new-token".to_string())
        }
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    struct TestResponse {
        message: String,
    }

    fn client(server: &MockServer, auth: Arc<RefreshingAuthProvider>) -> ApiClient {
        let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        ApiClient::new(config, auth).unwrap()
    }

    #[tokio::test]
    async fn test_get_with_json_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("Authorization", "Bearer old-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(TestResponse { message: "success".to_string() }),
            )
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let result: TestResponse = client(&mock_server, auth.clone()).get("/me").await.unwrap();

        assert_eq!(result.message, "success");
        assert_eq!(auth.refreshes(), 0);
    }

    /// Validates the single refresh-and-retry after a 401.
    ///
    /// # Test Steps
    /// 1. Reject `old-token` with 401, accept `new-token`
    /// 2. Issue one GET
    /// 3. Verify success, exactly one refresh and exactly two requests
    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Authorization", "Bearer old-token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Authorization", "Bearer new-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(TestResponse { message: "success".to_string() }),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let result: TestResponse = client(&mock_server, auth.clone()).get("/data").await.unwrap();

        assert_eq!(result.message, "success");
        assert_eq!(auth.refreshes(), 1);
    }

    #[tokio::test]
    async fn test_second_401_requires_authentication() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let result: Result<TestResponse, ApiError> =
            client(&mock_server, auth.clone()).get("/data").await;

        assert!(matches!(result.unwrap_err(), ApiError::AuthenticationRequired));
        assert_eq!(auth.refreshes(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_requires_authentication() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::failing_refresh());
        let result: Result<TestResponse, ApiError> =
            client(&mock_server, auth).get("/data").await;

        assert!(matches!(result.unwrap_err(), ApiError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn test_403_is_insufficient_permissions_without_refresh() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me/tracks"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Insufficient client scope"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let result: Result<TestResponse, ApiError> =
            client(&mock_server, auth.clone()).get("/me/tracks").await;

        assert!(matches!(result.unwrap_err(), ApiError::InsufficientPermissions));
        assert_eq!(auth.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_other_status_is_request_failed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let result: Result<TestResponse, ApiError> =
            client(&mock_server, auth).get("/error").await;

        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 502, .. }));
        assert_eq!(
            bydefeat_domain::ByDefeatError::from(err),
            bydefeat_domain::ByDefeatError::RequestFailed(502)
        );
    }

    #[tokio::test]
    async fn test_put_with_204_no_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .and(body_json(serde_json::json!({ "uris": ["spotify:track:a"] })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let body = serde_json::json!({ "uris": ["spotify:track:a"] });
        let result: Result<(), ApiError> =
            client(&mock_server, auth).put("/me/player/play", Some(&body)).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_empty_200_decodes_as_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/me/player/next"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let result: Option<TestResponse> = client(&mock_server, auth)
            .post::<serde_json::Value, _>("/me/player/next", None)
            .await
            .unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&mock_server)
            .await;

        let auth = Arc::new(RefreshingAuthProvider::default());
        let result: Result<TestResponse, ApiError> =
            client(&mock_server, auth).get("/broken").await;

        assert!(matches!(result.unwrap_err(), ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_builder_missing_auth() {
        let result = ApiClient::builder().build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_config_from_api_config_trims_slash() {
        let api = ApiConfig { base_url: "https://api.example.com/v1/".into(), ..Default::default() };
        let config = ApiClientConfig::from(&api);
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(REQUEST_TIMEOUT_SECS));
    }
}
