//! Traits for OAuth and token lifecycle operations
//!
//! These traits enable dependency injection and testing by abstracting the
//! authorization server and the exchanger that owns persisted credentials.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::error::AuthError;
use super::pkce::PkceChallenge;
use super::types::{CredentialRecord, TokenResponse};

/// Trait for OAuth client operations
///
/// Abstracts the authorization server so the exchanger can be tested against
/// a mock instead of a live token endpoint.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Authorization URL for this challenge
    fn authorization_url(&self, challenge: &PkceChallenge) -> String;

    /// Exchange an authorization code and verifier for tokens
    ///
    /// # Errors
    /// Returns error if the server rejects the code or the request fails
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Obtain a new access token from a refresh token
    ///
    /// # Errors
    /// Returns error if refresh fails or the token is invalid/revoked
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, OAuthClientError>;
}

/// Token lifecycle as seen by the session layer and the request gateway
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Start a login: persist a fresh handshake and return the authorization
    /// URL to open.
    ///
    /// # Errors
    /// Returns `AuthError::StorageUnavailable` if the handshake cannot be
    /// stored anywhere
    fn start_login(&self) -> Result<String, AuthError>;

    /// Exchange the code from the redirect for credentials
    ///
    /// # Errors
    /// See [`AuthError`] for the handshake, state and exchange failures
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_state: Option<&str>,
    ) -> Result<CredentialRecord, AuthError>;

    /// Refresh the access token, returning the new one
    ///
    /// # Errors
    /// Returns `NoRefreshToken` or `RefreshFailed`
    async fn refresh(&self) -> Result<String, AuthError>;

    /// Stored credentials that have not expired yet
    fn valid_credentials(&self) -> Option<CredentialRecord>;

    /// Persist credentials obtained elsewhere
    ///
    /// # Errors
    /// Returns `AuthError::StorageUnavailable` if the write fails
    fn save_credentials(&self, record: &CredentialRecord) -> Result<(), AuthError>;

    /// Forget the credential record, keeping any handshake
    fn clear_credentials(&self);

    /// Delete the pending handshake without using it
    fn abandon_login(&self);

    /// Forget every persisted record
    fn logout(&self);
}
