//! Mapping from Web API shapes to domain types
//!
//! One function per upstream shape. Every track that reaches the session,
//! whatever endpoint it came from, goes through [`map_track`].

use bydefeat_domain::{AudioFeatures, DeviceInfo, PlaybackSnapshot, Track, UserProfile};

use super::types::{
    PlayerResponse, SpotifyAudioFeatures, SpotifyDevice, SpotifyImage, SpotifyTrack, SpotifyUser,
};

/// Artist shown for tracks that credit nobody
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Map a track object. Tracks without an id (local files) are dropped.
pub fn map_track(track: SpotifyTrack, fallback_artist: &str) -> Option<Track> {
    let id = track.id?;
    let artist = track
        .artists
        .first()
        .map_or_else(|| fallback_artist.to_string(), |artist| artist.name.clone());
    let (album, image_url) = match track.album {
        Some(album) => (Some(album.name), largest_image(&album.images)),
        None => (None, None),
    };

    Some(Track {
        id,
        name: track.name,
        artist,
        album,
        duration_ms: track.duration_ms,
        preview_url: track.preview_url,
        image_url,
        uri: track.uri,
        popularity: track.popularity,
    })
}

/// Whether any credited artist matches `artist_name`, ignoring case.
pub fn is_by_artist(track: &SpotifyTrack, artist_name: &str) -> bool {
    track.artists.iter().any(|artist| artist.name.eq_ignore_ascii_case(artist_name))
}

/// Band tracks: only those credited to the band, most popular first, at most
/// `limit`.
pub fn map_band_tracks(tracks: Vec<SpotifyTrack>, artist_name: &str, limit: u32) -> Vec<Track> {
    let mut mapped: Vec<Track> = tracks
        .into_iter()
        .filter(|track| is_by_artist(track, artist_name))
        .filter_map(|track| map_track(track, artist_name))
        .collect();

    mapped.sort_by(|a, b| b.popularity.unwrap_or(0).cmp(&a.popularity.unwrap_or(0)));

    let mut seen = std::collections::HashSet::new();
    mapped.retain(|track| seen.insert(track.id.clone()));
    mapped.truncate(limit as usize);
    mapped
}

pub fn map_user(user: SpotifyUser) -> UserProfile {
    UserProfile {
        image_url: largest_image(&user.images),
        followers: user.followers.map(|f| f.total),
        id: user.id,
        display_name: user.display_name,
        email: user.email,
    }
}

pub fn map_playback(player: PlayerResponse, fallback_artist: &str) -> PlaybackSnapshot {
    PlaybackSnapshot {
        paused: !player.is_playing,
        position_ms: player.progress_ms.unwrap_or(0),
        track: player.item.and_then(|item| map_track(item, fallback_artist)),
    }
}

pub const fn map_audio_features(features: &SpotifyAudioFeatures) -> AudioFeatures {
    AudioFeatures {
        energy: features.energy,
        valence: features.valence,
        danceability: features.danceability,
        acousticness: features.acousticness,
        instrumentalness: features.instrumentalness,
        liveness: features.liveness,
        speechiness: features.speechiness,
        tempo: features.tempo,
    }
}

/// Restricted devices have no id and cannot be controlled.
pub fn map_device(device: SpotifyDevice) -> Option<DeviceInfo> {
    if device.is_restricted {
        return None;
    }
    Some(DeviceInfo { id: device.id?, name: device.name, is_active: device.is_active })
}

fn largest_image(images: &[SpotifyImage]) -> Option<String> {
    images
        .iter()
        .max_by_key(|image| image.width.unwrap_or(0))
        .map(|image| image.url.clone())
}
