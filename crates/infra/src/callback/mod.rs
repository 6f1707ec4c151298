//! OAuth redirect listener

pub mod server;

pub use server::{router, CallbackServer};
