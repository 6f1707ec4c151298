//! In-memory mock for `CatalogProvider`.

use std::time::Duration;

use async_trait::async_trait;
use bydefeat_core::CatalogProvider;
use bydefeat_domain::{
    AudioFeatures, ByDefeatError, PlaybackSnapshot, Result as DomainResult, Track, UserProfile,
};
use parking_lot::Mutex;

struct Responses {
    profile: DomainResult<UserProfile>,
    band_tracks: DomainResult<Vec<Track>>,
    saved_tracks: DomainResult<Vec<Track>>,
    playback: DomainResult<Option<PlaybackSnapshot>>,
    features: DomainResult<AudioFeatures>,
}

/// Catalog returning canned responses and recording which endpoints were
/// hit, in order.
pub struct MockCatalog {
    responses: Mutex<Responses>,
    calls: Mutex<Vec<&'static str>>,
    profile_delay: Mutex<Option<Duration>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self {
            responses: Mutex::new(Responses {
                profile: Ok(UserProfile {
                    id: "listener".into(),
                    display_name: Some("Listener".into()),
                    email: None,
                    image_url: None,
                    followers: Some(3),
                }),
                band_tracks: Ok(super::tracks(&["a", "b", "c"])),
                saved_tracks: Ok(Vec::new()),
                playback: Ok(None),
                features: Ok(features()),
            }),
            calls: Mutex::new(Vec::new()),
            profile_delay: Mutex::new(None),
        }
    }
}

pub fn features() -> AudioFeatures {
    AudioFeatures {
        energy: 0.8,
        valence: 0.4,
        danceability: 0.6,
        acousticness: 0.1,
        instrumentalness: 0.0,
        liveness: 0.3,
        speechiness: 0.04,
        tempo: 128.0,
    }
}

impl MockCatalog {
    pub fn with_band_tracks(self, result: DomainResult<Vec<Track>>) -> Self {
        self.responses.lock().band_tracks = result;
        self
    }

    pub fn with_profile(self, result: DomainResult<UserProfile>) -> Self {
        self.responses.lock().profile = result;
        self
    }

    /// Make `current_user` take `delay` before answering.
    pub fn with_profile_delay(self, delay: Duration) -> Self {
        *self.profile_delay.lock() = Some(delay);
        self
    }

    pub fn with_saved_tracks(self, result: DomainResult<Vec<Track>>) -> Self {
        self.responses.lock().saved_tracks = result;
        self
    }

    pub fn with_playback(self, result: DomainResult<Option<PlaybackSnapshot>>) -> Self {
        self.responses.lock().playback = result;
        self
    }

    pub fn fail_features_with(&self, err: ByDefeatError) {
        self.responses.lock().features = Err(err);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl CatalogProvider for MockCatalog {
    async fn current_user(&self) -> DomainResult<UserProfile> {
        self.record("current_user");
        let delay = *self.profile_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses.lock().profile.clone()
    }

    async fn band_tracks(&self, _artist_name: &str, limit: u32) -> DomainResult<Vec<Track>> {
        self.record("band_tracks");
        self.responses
            .lock()
            .band_tracks
            .clone()
            .map(|tracks| tracks.into_iter().take(limit as usize).collect())
    }

    async fn saved_tracks(&self, _limit: u32) -> DomainResult<Vec<Track>> {
        self.record("saved_tracks");
        self.responses.lock().saved_tracks.clone()
    }

    async fn playback_state(&self) -> DomainResult<Option<PlaybackSnapshot>> {
        self.record("playback_state");
        self.responses.lock().playback.clone()
    }

    async fn audio_features(&self, _track_id: &str) -> DomainResult<AudioFeatures> {
        self.record("audio_features");
        self.responses.lock().features.clone()
    }
}
