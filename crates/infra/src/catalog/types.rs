//! Web API response shapes
//!
//! Only the fields the player reads are declared; everything else in the
//! payloads is ignored by serde.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

/// Full track object as returned by search, top tracks, saved tracks and the
/// player
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    /// Missing for local files
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub album: Option<SpotifyAlbum>,
    pub duration_ms: u64,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub uri: String,
    #[serde(default)]
    pub popularity: Option<u8>,
}

/// Generic paging object
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// `GET /search`; only the requested type is present
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub artists: Option<Paging<SpotifyArtist>>,
    #[serde(default)]
    pub tracks: Option<Paging<SpotifyTrack>>,
}

/// `GET /artists/{id}/top-tracks`
#[derive(Debug, Clone, Deserialize)]
pub struct TopTracksResponse {
    pub tracks: Vec<SpotifyTrack>,
}

/// Item of `GET /me/tracks`
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTrackItem {
    pub track: SpotifyTrack,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Followers {
    pub total: u64,
}

/// `GET /me`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub followers: Option<Followers>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyDevice {
    /// Null for restricted devices
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(default)]
    pub volume_percent: Option<u8>,
}

/// `GET /me/player/devices`
#[derive(Debug, Clone, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<SpotifyDevice>,
}

/// `GET /me/player`; the endpoint answers 204 when nothing is active
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerResponse {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    /// Episodes and ads come through here too; they fail to parse as a
    /// track and are treated as no track.
    #[serde(default, deserialize_with = "lenient_track")]
    pub item: Option<SpotifyTrack>,
    #[serde(default)]
    pub device: Option<SpotifyDevice>,
}

/// `GET /audio-features/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAudioFeatures {
    pub energy: f32,
    pub valence: f32,
    pub danceability: f32,
    pub acousticness: f32,
    pub instrumentalness: f32,
    pub liveness: f32,
    pub speechiness: f32,
    pub tempo: f32,
}

fn lenient_track<'de, D>(deserializer: D) -> Result<Option<SpotifyTrack>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
