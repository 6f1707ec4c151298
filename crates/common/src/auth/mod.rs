//! OAuth 2.0 + PKCE login and token lifecycle
//!
//! A public client login against the streaming service's authorization
//! server, split in two phases across the browser redirect:
//!
//! 1. [`TokenExchanger::start_login`] generates a PKCE challenge, persists
//!    the handshake and returns the authorization URL.
//! 2. The redirect lands on `/callback`; the code is exchanged with
//!    [`TokenExchanger::exchange_authorization_code`], which reads the
//!    verifier back from durable storage only.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ TokenExchanger  │  lifecycle + in-flight exchange registry
//! └────────┬────────┘
//!          │
//!          ├──► OAuthClient        (token endpoint HTTP)
//!          ├──► CredentialStore    (handshake + credential records)
//!          │         │
//!          │         └──► KeyValueStore × 2  (primary, secondary)
//!          │
//!          └──► PKCE utilities     (challenge generation)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `CredentialRecord`, `HandshakeRecord`, `OAuthConfig`
//! - **[`pkce`]**: PKCE challenge generation and validation
//! - **[`client`]**: OAuth HTTP client for token exchange and refresh
//! - **[`store`]**: Credential store over two key-value backends
//! - **[`exchanger`]**: Token exchanger
//! - **[`error`]**: `AuthError` taxonomy

pub mod client;
pub mod error;
pub mod exchanger;
pub mod pkce;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use client::{OAuthClient, OAuthClientError};
pub use error::AuthError;
pub use exchanger::{TokenExchanger, DEFAULT_HANDSHAKE_TTL};
pub use pkce::{
    generate_code_challenge, generate_code_verifier, generate_state, validate_state, PkceChallenge,
};
pub use store::CredentialStore;
pub use traits::{OAuthClientTrait, TokenExchange};
pub use types::{CredentialRecord, HandshakeRecord, OAuthConfig, OAuthError, TokenResponse};
