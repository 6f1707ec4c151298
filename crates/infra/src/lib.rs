//! # By Defeat Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The authenticated request gateway over the catalog API
//! - Catalog and remote playback adapters for the streaming service
//! - Keychain and JSON file key-value stores
//! - Configuration loading and the OAuth loopback listener
//!
//! ## Architecture
//! - Implements traits defined in `bydefeat-core` and `bydefeat-common`
//! - Contains all "impure" code (HTTP, keychain, filesystem, sockets)

pub mod api;
pub mod callback;
pub mod catalog;
pub mod config;
pub mod playback;
pub mod storage;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiClient, ApiClientConfig, ApiError, ExchangerTokenProvider};
pub use callback::CallbackServer;
pub use catalog::SpotifyCatalog;
pub use playback::RemotePlaybackDevice;
pub use storage::{JsonFileStore, KeychainStore};
