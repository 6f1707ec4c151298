//! Commands behind the CLI subcommands

pub mod auth;
pub mod player;

pub use auth::{login, logout, restore_session, status};
pub use player::{audio_features, saved_tracks, tracks, transport, Transport};
