//! Session state machine
//!
//! - **[`state`]**: `SessionState` and `AuthStatus`
//! - **[`action`]**: the `SessionAction` set
//! - **[`reducer`]**: the pure transition function
//! - **[`service`]**: `SessionService`, which runs the I/O and dispatches

pub mod action;
pub mod reducer;
pub mod service;
pub mod state;

pub use action::SessionAction;
pub use reducer::reduce;
pub use service::{BandSettings, SessionService};
pub use state::{AuthStatus, SessionState};
