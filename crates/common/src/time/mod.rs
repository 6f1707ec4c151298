//! Time utilities and abstractions
//!
//! - **Clock abstractions**: real and mock wall-clock time. Expiry and
//!   staleness checks read the clock through [`Clock`] so tests can pin time.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use bydefeat_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at_epoch_ms(1_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.millis_since_epoch(), 6_000);
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
