//! OAuth redirect handling
//!
//! - **[`params`]**: `code` / `state` / `error` extraction from the redirect
//! - **[`handler`]**: the `CallbackHandler` state machine

pub mod handler;
pub mod params;

pub use handler::{CallbackFailure, CallbackHandler, CallbackState, DEFAULT_CALLBACK_TIMEOUT};
pub use params::RedirectParams;
