//! Playback state reported by an output device

use serde::{Deserialize, Serialize};

use super::track::Track;

/// Point-in-time view of what a playback device is doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub paused: bool,
    pub position_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Track>,
}

impl PlaybackSnapshot {
    /// Playback position as a percentage of the track duration, clamped to
    /// 0..=100. Zero when no track or no duration is known.
    #[must_use]
    pub fn progress_percent(&self) -> f32 {
        match &self.track {
            Some(track) if track.duration_ms > 0 => {
                #[allow(clippy::cast_precision_loss)]
                let ratio = self.position_ms as f32 / track.duration_ms as f32;
                (ratio * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }
}

/// An output device registered with the playback service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}
