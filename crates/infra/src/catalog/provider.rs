//! Catalog provider over the streaming service's Web API

use std::sync::Arc;

use async_trait::async_trait;
use bydefeat_core::CatalogProvider;
use bydefeat_domain::constants::DEFAULT_MARKET;
use bydefeat_domain::{AudioFeatures, PlaybackSnapshot, Result, Track, UserProfile};
use tracing::{debug, info, instrument};

use super::mapping::{
    map_audio_features, map_band_tracks, map_playback, map_track, map_user, UNKNOWN_ARTIST,
};
use super::types::{
    Paging, PlayerResponse, SavedTrackItem, SearchResponse, SpotifyAudioFeatures, SpotifyUser,
    TopTracksResponse,
};
use crate::api::ApiClient;

/// Largest page the search endpoint serves
const SEARCH_PAGE_LIMIT: u32 = 50;

/// Web API implementation of [`CatalogProvider`]
pub struct SpotifyCatalog {
    client: Arc<ApiClient>,
    market: String,
}

impl SpotifyCatalog {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, market: DEFAULT_MARKET.to_string() }
    }

    #[must_use]
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = market.into();
        self
    }

    /// Id of the best artist match for `artist_name`, preferring an exact
    /// (case-insensitive) name match over the first hit.
    async fn find_artist(&self, artist_name: &str) -> Result<Option<String>> {
        let path = format!("/search?q={}&type=artist&limit=5", urlencoding::encode(artist_name));
        let response: SearchResponse = self.client.get(&path).await?;
        let artists = response.artists.map(|page| page.items).unwrap_or_default();

        let exact = artists.iter().find(|artist| artist.name.eq_ignore_ascii_case(artist_name));
        Ok(exact.or_else(|| artists.first()).and_then(|artist| artist.id.clone()))
    }

    async fn top_tracks(
        &self,
        artist_id: &str,
        artist_name: &str,
        limit: u32,
    ) -> Result<Vec<Track>> {
        let path = format!(
            "/artists/{}/top-tracks?market={}",
            urlencoding::encode(artist_id),
            urlencoding::encode(&self.market)
        );
        let response: TopTracksResponse = self.client.get(&path).await?;
        Ok(map_band_tracks(response.tracks, artist_name, limit))
    }

    async fn search_tracks(&self, artist_name: &str, limit: u32) -> Result<Vec<Track>> {
        let query = format!("artist:\"{artist_name}\"");
        let path = format!(
            "/search?q={}&type=track&limit={SEARCH_PAGE_LIMIT}",
            urlencoding::encode(&query)
        );
        let response: SearchResponse = self.client.get(&path).await?;
        let tracks = response.tracks.map(|page| page.items).unwrap_or_default();
        Ok(map_band_tracks(tracks, artist_name, limit))
    }
}

#[async_trait]
impl CatalogProvider for SpotifyCatalog {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<UserProfile> {
        let user: SpotifyUser = self.client.get("/me").await?;
        Ok(map_user(user))
    }

    /// Top tracks of the matched artist; falls back to a track search when
    /// the artist is unknown or has no top tracks credited to it.
    #[instrument(skip(self))]
    async fn band_tracks(&self, artist_name: &str, limit: u32) -> Result<Vec<Track>> {
        if let Some(artist_id) = self.find_artist(artist_name).await? {
            let tracks = self.top_tracks(&artist_id, artist_name, limit).await?;
            if !tracks.is_empty() {
                info!(count = tracks.len(), "Loaded band tracks from artist top tracks");
                return Ok(tracks);
            }
            debug!(artist_id = %artist_id, "Artist has no matching top tracks");
        }

        let tracks = self.search_tracks(artist_name, limit).await?;
        info!(count = tracks.len(), "Loaded band tracks from track search");
        Ok(tracks)
    }

    #[instrument(skip(self))]
    async fn saved_tracks(&self, limit: u32) -> Result<Vec<Track>> {
        let path = format!("/me/tracks?limit={}", limit.min(SEARCH_PAGE_LIMIT));
        let page: Paging<SavedTrackItem> = self.client.get(&path).await?;
        Ok(page
            .items
            .into_iter()
            .filter_map(|item| map_track(item.track, UNKNOWN_ARTIST))
            .collect())
    }

    #[instrument(skip(self))]
    async fn playback_state(&self) -> Result<Option<PlaybackSnapshot>> {
        let player: Option<PlayerResponse> = self.client.get("/me/player").await?;
        Ok(player.map(|player| map_playback(player, UNKNOWN_ARTIST)))
    }

    #[instrument(skip(self))]
    async fn audio_features(&self, track_id: &str) -> Result<AudioFeatures> {
        let path = format!("/audio-features/{}", urlencoding::encode(track_id));
        let features: SpotifyAudioFeatures = self.client.get(&path).await?;
        Ok(map_audio_features(&features))
    }
}
