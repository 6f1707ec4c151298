//! Session reducer
//!
//! Pure transition function over [`SessionState`]. It never performs I/O and
//! never fails; see [`SessionService`](super::SessionService) for the side
//! effects.

use super::action::SessionAction;
use super::state::{AuthStatus, SessionState};

/// Apply one action.
#[must_use]
pub fn reduce(mut state: SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::Authenticate => {
            state.auth_status = AuthStatus::Authenticated;
            state.error = None;
        }
        SessionAction::Logout => return SessionState::initial(),
        SessionAction::SetAuthenticating => {
            state.auth_status = AuthStatus::Authenticating;
            state.is_playing = false;
            state.error = None;
        }
        SessionAction::SetAuthError(reason) => {
            state.auth_status = AuthStatus::AuthError(reason);
            state.is_playing = false;
            state.loading = false;
        }
        SessionAction::SetPlaying(playing) => set_playing(&mut state, playing),
        SessionAction::TogglePlay => {
            let playing = !state.is_playing;
            set_playing(&mut state, playing);
        }
        SessionAction::SetProgress(progress) => {
            if !progress.is_nan() {
                state.progress = progress.clamp(0.0, 100.0);
            }
        }
        SessionAction::SetVolume(volume) => {
            if !volume.is_nan() {
                state.volume = volume.clamp(0.0, 1.0);
            }
        }
        SessionAction::SetPlaylist(tracks) => {
            state.playlist = tracks;
            if state.playlist.is_empty() {
                state.current_index = 0;
                state.current_track = None;
                reset_track_position(&mut state);
            } else {
                select_index(&mut state, 0);
            }
        }
        SessionAction::SetCurrentIndex(index) => {
            if index < state.playlist.len() {
                select_index(&mut state, index);
            }
        }
        SessionAction::SetCurrentTrack(track) => {
            let same_track = match (&state.current_track, &track) {
                (Some(current), Some(next)) => current.id == next.id,
                _ => false,
            };
            if !same_track {
                reset_track_position(&mut state);
            }
            if let Some(track) = &track {
                if let Some(index) = state.playlist.iter().position(|t| t.id == track.id) {
                    state.current_index = index;
                }
            }
            state.current_track = track;
        }
        SessionAction::NextTrack => {
            let len = state.playlist.len();
            if len > 0 {
                let index = (state.current_index + 1) % len;
                select_index(&mut state, index);
            }
        }
        SessionAction::PreviousTrack => {
            let len = state.playlist.len();
            if len > 0 {
                let index = (state.current_index % len + len - 1) % len;
                select_index(&mut state, index);
            }
        }
        SessionAction::SetAudioFeatures(features) => state.audio_features = features,
        SessionAction::SetLoading(loading) => state.loading = loading,
        SessionAction::SetError(error) => state.error = error,
        SessionAction::SetUserProfile(profile) => state.profile = profile,
        SessionAction::SetSavedTracks(tracks) => state.saved_tracks = tracks,
        SessionAction::SetDevice(device_id) => state.device_id = device_id,
    }
    state
}

fn set_playing(state: &mut SessionState, playing: bool) {
    // Playback needs a session; ignore play requests while logged out.
    if playing && !state.is_authenticated() {
        return;
    }
    state.is_playing = playing;
}

/// Select a playlist entry. `index` must be in range.
fn select_index(state: &mut SessionState, index: usize) {
    state.current_index = index;
    state.current_track = state.playlist.get(index).cloned();
    reset_track_position(state);
}

/// Progress and audio features belong to one track.
fn reset_track_position(state: &mut SessionState) {
    state.progress = 0.0;
    state.audio_features = None;
}
