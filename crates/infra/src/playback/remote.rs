//! Remote playback device controlled through the player endpoints
//!
//! Audio is rendered by whichever Connect device the listener picks; this
//! adapter only sends transport commands to it.

use std::sync::Arc;

use async_trait::async_trait;
use bydefeat_core::PlaybackDevice;
use bydefeat_domain::{ByDefeatError, DeviceInfo, PlaybackSnapshot, Result};
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::api::ApiClient;
use crate::catalog::mapping::{map_device, map_playback, UNKNOWN_ARTIST};
use crate::catalog::types::{DevicesResponse, PlayerResponse};

/// [`PlaybackDevice`] over `/me/player/*`
pub struct RemotePlaybackDevice {
    client: Arc<ApiClient>,
    /// Device to prefer when several are available
    preferred_name: Option<String>,
    device_id: Mutex<Option<String>>,
}

impl RemotePlaybackDevice {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, preferred_name: None, device_id: Mutex::new(None) }
    }

    #[must_use]
    pub fn with_preferred_device(mut self, name: impl Into<String>) -> Self {
        self.preferred_name = Some(name.into());
        self
    }

    /// Devices currently available to the account
    ///
    /// # Errors
    /// Propagates gateway failures
    pub async fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let response: DevicesResponse = self.client.get("/me/player/devices").await?;
        Ok(response.devices.into_iter().filter_map(map_device).collect())
    }

    pub fn device_id(&self) -> Option<String> {
        self.device_id.lock().clone()
    }

    fn choose(&self, devices: &[DeviceInfo]) -> Option<DeviceInfo> {
        let preferred = self.preferred_name.as_deref().and_then(|name| {
            devices.iter().find(|device| device.name.eq_ignore_ascii_case(name))
        });
        preferred
            .or_else(|| devices.iter().find(|device| device.is_active))
            .or_else(|| devices.first())
            .cloned()
    }

    /// `path` with the connected device appended as `device_id`.
    fn targeted(&self, path: &str) -> String {
        match self.device_id() {
            Some(id) => {
                let separator = if path.contains('?') { '&' } else { '?' };
                format!("{path}{separator}device_id={}", urlencoding::encode(&id))
            }
            None => path.to_string(),
        }
    }

    /// Bodiless transport command against the connected device.
    async fn command(&self, method: Method, path: &str) -> Result<()> {
        self.client.request::<()>(method, &self.targeted(path), None).await?;
        Ok(())
    }
}

#[async_trait]
impl PlaybackDevice for RemotePlaybackDevice {
    #[instrument(skip(self))]
    async fn connect(&self) -> Result<String> {
        let devices = self.devices().await?;
        let device = self.choose(&devices).ok_or_else(|| {
            ByDefeatError::Playback("no playback device available; open a player first".into())
        })?;

        if !device.is_active {
            debug!(device = %device.name, "Transferring playback");
            let body = json!({ "device_ids": [device.id.as_str()], "play": false });
            self.client.put::<_, ()>("/me/player", Some(&body)).await?;
        }

        info!(device = %device.name, "Playback device connected");
        *self.device_id.lock() = Some(device.id.clone());
        Ok(device.id)
    }

    async fn disconnect(&self) -> Result<()> {
        self.device_id.lock().take();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn play_uri(&self, uri: &str) -> Result<()> {
        let body = json!({ "uris": [uri] });
        self.client.put::<_, ()>(&self.targeted("/me/player/play"), Some(&body)).await?;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.command(Method::PUT, "/me/player/pause").await
    }

    async fn resume(&self) -> Result<()> {
        self.command(Method::PUT, "/me/player/play").await
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        let percent = volume_percent(volume);
        self.command(Method::PUT, &format!("/me/player/volume?volume_percent={percent}")).await
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        self.command(Method::PUT, &format!("/me/player/seek?position_ms={position_ms}")).await
    }

    async fn next_track(&self) -> Result<()> {
        self.command(Method::POST, "/me/player/next").await
    }

    async fn previous_track(&self) -> Result<()> {
        self.command(Method::POST, "/me/player/previous").await
    }

    async fn current_state(&self) -> Result<Option<PlaybackSnapshot>> {
        let player: Option<PlayerResponse> = self.client.get("/me/player").await?;
        Ok(player.map(|player| map_playback(player, UNKNOWN_ARTIST)))
    }
}

/// Volume in `0.0..=1.0` as the 0-100 percentage the endpoint expects.
fn volume_percent(volume: f32) -> u8 {
    let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (volume * 100.0).round() as u8;
    percent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_percent_is_clamped() {
        assert_eq!(volume_percent(0.8), 80);
        assert_eq!(volume_percent(1.7), 100);
        assert_eq!(volume_percent(-0.2), 0);
        assert_eq!(volume_percent(f32::NAN), 0);
    }
}
