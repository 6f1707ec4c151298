//! # By Defeat Core
//!
//! Session logic for the player - no HTTP, keychain or file code.
//!
//! This crate contains:
//! - The session state machine (pure reducer) and its orchestration service
//! - The OAuth redirect callback handler
//! - Port interfaces (traits) for the catalog provider and playback device
//!
//! ## Architecture Principles
//! - Depends only on `bydefeat-common` and `bydefeat-domain`
//! - All external collaborators via traits
//! - Reducer stays synchronous and pure; I/O lives in [`SessionService`]

pub mod callback;
pub mod session;

// Infrastructure ports
pub mod catalog_ports;
pub mod playback_ports;

pub use callback::{CallbackFailure, CallbackHandler, CallbackState, RedirectParams};
pub use catalog_ports::CatalogProvider;
pub use playback_ports::PlaybackDevice;
pub use session::{reduce, AuthStatus, BandSettings, SessionAction, SessionService, SessionState};
