//! Recording mock for `PlaybackDevice`.

use async_trait::async_trait;
use bydefeat_core::PlaybackDevice;
use bydefeat_domain::{ByDefeatError, PlaybackSnapshot, Result as DomainResult};
use parking_lot::Mutex;

/// Device that records every command as a string such as
/// `"play_uri spotify:track:a"` or `"set_volume 0.50"`.
pub struct MockPlaybackDevice {
    device_id: String,
    commands: Mutex<Vec<String>>,
    remote: Mutex<Option<PlaybackSnapshot>>,
    failure: Mutex<Option<ByDefeatError>>,
}

impl MockPlaybackDevice {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            commands: Mutex::new(Vec::new()),
            remote: Mutex::new(None),
            failure: Mutex::new(None),
        }
    }

    /// Every following command fails with `err`.
    pub fn fail_with(&self, err: ByDefeatError) {
        *self.failure.lock() = Some(err);
    }

    pub fn set_remote_state(&self, snapshot: Option<PlaybackSnapshot>) {
        *self.remote.lock() = snapshot;
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    fn run(&self, command: String) -> DomainResult<()> {
        self.commands.lock().push(command);
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlaybackDevice for MockPlaybackDevice {
    async fn connect(&self) -> DomainResult<String> {
        self.run("connect".into())?;
        Ok(self.device_id.clone())
    }

    async fn disconnect(&self) -> DomainResult<()> {
        self.run("disconnect".into())
    }

    async fn play_uri(&self, uri: &str) -> DomainResult<()> {
        self.run(format!("play_uri {uri}"))
    }

    async fn pause(&self) -> DomainResult<()> {
        self.run("pause".into())
    }

    async fn resume(&self) -> DomainResult<()> {
        self.run("resume".into())
    }

    async fn set_volume(&self, volume: f32) -> DomainResult<()> {
        self.run(format!("set_volume {volume:.2}"))
    }

    async fn seek(&self, position_ms: u64) -> DomainResult<()> {
        self.run(format!("seek {position_ms}"))
    }

    async fn next_track(&self) -> DomainResult<()> {
        self.run("next_track".into())
    }

    async fn previous_track(&self) -> DomainResult<()> {
        self.run("previous_track".into())
    }

    async fn current_state(&self) -> DomainResult<Option<PlaybackSnapshot>> {
        self.run("current_state".into())?;
        Ok(self.remote.lock().clone())
    }
}
