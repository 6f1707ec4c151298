//! Playback device port.
//!
//! Any audio output the session can drive: a remote player controlled
//! through the streaming service, or a local one.

use async_trait::async_trait;
use bydefeat_domain::{PlaybackSnapshot, Result};

/// Port for controlling an audio output.
#[async_trait]
pub trait PlaybackDevice: Send + Sync {
    /// Attach to the device and return its id.
    async fn connect(&self) -> Result<String>;

    /// Release the device. Safe to call when not connected.
    async fn disconnect(&self) -> Result<()>;

    /// Start playing `uri` from the beginning.
    async fn play_uri(&self, uri: &str) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Continue whatever was paused.
    async fn resume(&self) -> Result<()>;

    /// Set the output volume.
    ///
    /// # Arguments
    /// * `volume` - Level in `0.0..=1.0`
    async fn set_volume(&self, volume: f32) -> Result<()>;

    async fn seek(&self, position_ms: u64) -> Result<()>;

    async fn next_track(&self) -> Result<()>;

    async fn previous_track(&self) -> Result<()>;

    /// What the device is doing right now, `None` when idle.
    async fn current_state(&self) -> Result<Option<PlaybackSnapshot>>;
}
