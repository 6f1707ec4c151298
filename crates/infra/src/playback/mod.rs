//! Playback device adapters

pub mod remote;

pub use remote::RemotePlaybackDevice;
