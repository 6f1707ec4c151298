//! Catalog API gateway
//!
//! Authenticated HTTP access to the streaming service's Web API. The catalog
//! and playback adapters build on [`ApiClient`].
//!
//! # Architecture
//!
//! - Bearer token from an [`AccessTokenProvider`]
//! - 401 → one refresh, one retry; no backoff, no circuit breaker
//! - Every failure maps onto a domain error via [`ApiError`]
//! - Timeout on every HTTP attempt

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::{AccessTokenProvider, ExchangerTokenProvider};
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use errors::{ApiError, ApiErrorCategory};
