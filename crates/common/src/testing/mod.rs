//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of the storage and OAuth traits
//!
//! ## Usage
//!
//! ```rust
//! use bydefeat_common::testing::UnavailableStore;
//! use bydefeat_common::storage::KeyValueStore;
//!
//! let store = UnavailableStore::default();
//! assert!(store.set("key", "value").is_err());
//! ```

pub mod mocks;

#[cfg(feature = "platform")]
pub use mocks::MockOAuthClient;
pub use mocks::UnavailableStore;

pub use crate::time::{Clock, MockClock, SystemClock};
