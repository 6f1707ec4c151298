//! Modular common utilities shared across By Defeat crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: serde/thiserror based primitives
//! - `runtime`: clock abstraction and key-value storage
//! - `platform`: PKCE login, credential store and token exchange
//! - `observability`: tracing (pulled in by `runtime`)
//! - `test-utils`: mocks for the traits defined here

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod storage;
#[cfg(feature = "runtime")]
pub mod time;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "runtime", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{AuthError, CredentialRecord, CredentialStore, HandshakeRecord, TokenExchanger};
#[cfg(feature = "runtime")]
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, SystemClock};
