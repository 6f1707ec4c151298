//! Session actions

use bydefeat_domain::{AudioFeatures, Track, UserProfile};

/// Every transition the session state machine accepts
///
/// No action is illegal in any state; combinations that make no sense (a
/// track change on an empty playlist, playing while logged out) are
/// normalized by the reducer into no-ops.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Credentials are in place. Persisting them is the caller's job.
    Authenticate,
    /// Back to the initial state.
    Logout,
    SetAuthenticating,
    SetAuthError(String),
    SetPlaying(bool),
    TogglePlay,
    /// Percentage of the current track, clamped to 0..=100.
    SetProgress(f32),
    /// Output level, clamped to 0.0..=1.0.
    SetVolume(f32),
    SetPlaylist(Vec<Track>),
    SetCurrentIndex(usize),
    /// Track reported by a playback device; may be outside the playlist.
    SetCurrentTrack(Option<Track>),
    NextTrack,
    PreviousTrack,
    SetAudioFeatures(Option<AudioFeatures>),
    SetLoading(bool),
    SetError(Option<String>),
    SetUserProfile(Option<UserProfile>),
    SetSavedTracks(Vec<Track>),
    SetDevice(Option<String>),
}

impl SessionAction {
    /// Short name for log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::Logout => "logout",
            Self::SetAuthenticating => "set_authenticating",
            Self::SetAuthError(_) => "set_auth_error",
            Self::SetPlaying(_) => "set_playing",
            Self::TogglePlay => "toggle_play",
            Self::SetProgress(_) => "set_progress",
            Self::SetVolume(_) => "set_volume",
            Self::SetPlaylist(_) => "set_playlist",
            Self::SetCurrentIndex(_) => "set_current_index",
            Self::SetCurrentTrack(_) => "set_current_track",
            Self::NextTrack => "next_track",
            Self::PreviousTrack => "previous_track",
            Self::SetAudioFeatures(_) => "set_audio_features",
            Self::SetLoading(_) => "set_loading",
            Self::SetError(_) => "set_error",
            Self::SetUserProfile(_) => "set_user_profile",
            Self::SetSavedTracks(_) => "set_saved_tracks",
            Self::SetDevice(_) => "set_device",
        }
    }
}
