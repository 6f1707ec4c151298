//! Domain types and models
//!
//! Canonical shapes shared by the catalog adapters, the session reducer and
//! the CLI. Upstream JSON is mapped into these types at the infra boundary.

pub mod playback;
pub mod track;
pub mod user;

pub use playback::{DeviceInfo, PlaybackSnapshot};
pub use track::{AudioFeatures, Track};
pub use user::UserProfile;
