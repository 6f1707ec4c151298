//! Session state

use bydefeat_domain::constants::{demo_playlist, DEFAULT_VOLUME};
use bydefeat_domain::{AudioFeatures, Track, UserProfile};
use serde::Serialize;

/// Where the listener is in the login lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AuthStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
    AuthError(String),
}

impl AuthStatus {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Everything the renderer shows
///
/// Only the reducer produces new values. `current_index` points into
/// `playlist` whenever the playlist is non-empty, and `is_playing` is never
/// true unless `auth_status` is [`AuthStatus::Authenticated`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub auth_status: AuthStatus,
    pub current_track: Option<Track>,
    /// Band catalog, in catalog order
    pub playlist: Vec<Track>,
    pub current_index: usize,
    pub is_playing: bool,
    /// Position in the current track, 0..=100
    pub progress: f32,
    /// Output level, 0.0..=1.0
    pub volume: f32,
    pub audio_features: Option<AudioFeatures>,
    pub loading: bool,
    pub error: Option<String>,
    pub profile: Option<UserProfile>,
    pub saved_tracks: Vec<Track>,
    pub device_id: Option<String>,
}

impl SessionState {
    /// Logged-out state with the bundled demo playlist selected.
    #[must_use]
    pub fn initial() -> Self {
        let playlist = demo_playlist();
        Self {
            auth_status: AuthStatus::Unauthenticated,
            current_track: playlist.first().cloned(),
            playlist,
            current_index: 0,
            is_playing: false,
            progress: 0.0,
            volume: DEFAULT_VOLUME,
            audio_features: None,
            loading: false,
            error: None,
            profile: None,
            saved_tracks: Vec::new(),
            device_id: None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.auth_status.is_authenticated()
    }

    /// Position of the current track in milliseconds, derived from
    /// `progress`.
    #[must_use]
    pub fn position_ms(&self) -> u64 {
        let Some(track) = &self.current_track else {
            return 0;
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let position = (track.duration_ms as f64 * f64::from(self.progress) / 100.0) as u64;
        position.min(track.duration_ms)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_selects_first_demo_track() {
        let state = SessionState::initial();

        assert_eq!(state.auth_status, AuthStatus::Unauthenticated);
        assert_eq!(state.playlist, demo_playlist());
        assert_eq!(state.current_track.as_ref(), state.playlist.first());
        assert!(!state.is_playing);
        assert!((state.volume - DEFAULT_VOLUME).abs() < f32::EPSILON);
    }

    #[test]
    fn position_follows_progress() {
        let mut state = SessionState::initial();
        state.progress = 50.0;
        let duration = state.current_track.as_ref().map_or(0, |t| t.duration_ms);

        assert_eq!(state.position_ms(), duration / 2);

        state.current_track = None;
        assert_eq!(state.position_ms(), 0);
    }

    #[test]
    fn auth_status_serializes_with_reason() {
        let json = serde_json::to_value(AuthStatus::AuthError("denied".into())).unwrap();
        assert_eq!(json["status"], "auth_error");
        assert_eq!(json["reason"], "denied");
    }
}
