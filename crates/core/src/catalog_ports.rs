//! Catalog provider port.
//!
//! The music-metadata API the session loads its data from after login:
//! profile, the band's tracks, the listener's saved tracks, any playback
//! already running elsewhere and per-track audio features.
//!
//! # Example
//!
//! ```no_run
//! use bydefeat_core::CatalogProvider;
//!
//! async fn band_track_count(catalog: &impl CatalogProvider) -> usize {
//!     catalog.band_tracks("By Defeat", 20).await.map(|t| t.len()).unwrap_or(0)
//! }
//! ```

use async_trait::async_trait;
use bydefeat_domain::{AudioFeatures, PlaybackSnapshot, Result, Track, UserProfile};

/// Port for reading catalog and listener data.
///
/// Implementations run every call through the authenticated request gateway,
/// so an expired session surfaces as
/// [`ByDefeatError::AuthenticationRequired`](bydefeat_domain::ByDefeatError)
/// and a missing scope as `InsufficientPermissions`.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Profile of the signed-in listener.
    async fn current_user(&self) -> Result<UserProfile>;

    /// The band's tracks, most popular first.
    ///
    /// An empty list is a valid answer (artist not found, nothing
    /// released in the market); the caller decides how to fall back.
    ///
    /// # Arguments
    /// * `artist_name` - Artist to look up
    /// * `limit` - Upper bound on the number of tracks returned
    async fn band_tracks(&self, artist_name: &str, limit: u32) -> Result<Vec<Track>>;

    /// Tracks saved in the listener's library.
    async fn saved_tracks(&self, limit: u32) -> Result<Vec<Track>>;

    /// Playback currently running on any of the listener's devices.
    ///
    /// `Ok(None)` when nothing is playing anywhere.
    async fn playback_state(&self) -> Result<Option<PlaybackSnapshot>>;

    /// Audio analysis for one track.
    async fn audio_features(&self, track_id: &str) -> Result<AudioFeatures>;
}
