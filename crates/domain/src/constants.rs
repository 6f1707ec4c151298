//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

use crate::types::Track;

// Band
pub const BAND_NAME: &str = "By Defeat";
pub const DEFAULT_MARKET: &str = "US";
pub const DEFAULT_CATALOG_LIMIT: u32 = 20;

// Authorization server and catalog API
pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const CALLBACK_PATH: &str = "/callback";

/// Scopes requested on every login.
pub const DEFAULT_SCOPES: &[&str] = &[
    "streaming",
    "user-read-email",
    "user-read-private",
    "user-library-read",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-recently-played",
];

// Auth timing
pub const HANDSHAKE_TTL_SECS: u64 = 10 * 60;
pub const CALLBACK_TIMEOUT_SECS: u64 = 30;
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

// Player defaults
pub const DEFAULT_VOLUME: f32 = 0.8;
pub const PLAYER_NAME: &str = "By Defeat Web Player";

// Storage
pub const KEYCHAIN_SERVICE: &str = "com.bydefeat.player";
pub const STORE_FILE_NAME: &str = "bydefeat-store.json";

struct DemoTrack {
    id: &'static str,
    name: &'static str,
    duration_ms: u64,
    popularity: u8,
    uri: &'static str,
}

const DEMO_TRACKS: [DemoTrack; 2] = [
    DemoTrack {
        id: "1",
        name: "Sample Track 1",
        duration_ms: 180_000,
        popularity: 75,
        uri: "spotify:track:sample1",
    },
    DemoTrack {
        id: "2",
        name: "Sample Track 2",
        duration_ms: 210_000,
        popularity: 80,
        uri: "spotify:track:sample2",
    },
];

/// Bundled playlist shown before login and whenever the catalog is
/// unavailable.
#[must_use]
pub fn demo_playlist() -> Vec<Track> {
    DEMO_TRACKS
        .iter()
        .map(|demo| Track {
            id: demo.id.to_string(),
            name: demo.name.to_string(),
            artist: BAND_NAME.to_string(),
            album: Some("Demo Album".to_string()),
            duration_ms: demo.duration_ms,
            preview_url: None,
            image_url: None,
            uri: demo.uri.to_string(),
            popularity: Some(demo.popularity),
        })
        .collect()
}
