//! Catalog and transport commands
//!
//! Every command restores the persisted session first, so each CLI
//! invocation works against fresh credentials and catalog data.

use bydefeat_core::{SessionAction, SessionState};
use bydefeat_domain::{AudioFeatures, ByDefeatError, Result, Track};

use super::auth::restore_session;
use crate::context::AppContext;
use crate::utils::execute_logged;

/// Transport actions that need a connected device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transport {
    Play(Option<usize>),
    Pause,
    Next,
    Previous,
    Volume(f32),
    Seek(f32),
}

impl Transport {
    const fn command_name(self) -> &'static str {
        match self {
            Self::Play(_) => "player::play",
            Self::Pause => "player::pause",
            Self::Next => "player::next",
            Self::Previous => "player::previous",
            Self::Volume(_) => "player::volume",
            Self::Seek(_) => "player::seek",
        }
    }
}

/// Band catalog, or the demo playlist when logged out or the catalog failed.
///
/// # Errors
/// See [`restore_session`].
pub async fn tracks(ctx: &AppContext) -> Result<Vec<Track>> {
    execute_logged("player::tracks", || async {
        restore_session(ctx).await?;
        Ok(ctx.session.state().playlist)
    })
    .await
}

/// Tracks saved in the listener's library.
///
/// # Errors
/// `AuthenticationRequired` without a stored session.
pub async fn saved_tracks(ctx: &AppContext) -> Result<Vec<Track>> {
    execute_logged("player::saved_tracks", || async {
        require_session(ctx).await?;
        Ok(ctx.session.state().saved_tracks)
    })
    .await
}

/// Audio features of the playlist entry at `index`.
///
/// # Errors
/// `Playback` for an index outside the playlist, otherwise the catalog's
/// error.
pub async fn audio_features(ctx: &AppContext, index: usize) -> Result<Option<AudioFeatures>> {
    execute_logged("player::audio_features", || async {
        require_session(ctx).await?;
        let session = &ctx.session;

        let len = session.state().playlist.len();
        if index >= len {
            return Err(ByDefeatError::Playback(format!(
                "no track at index {index} (playlist has {len})"
            )));
        }
        session.dispatch(SessionAction::SetCurrentIndex(index));

        let Some(track) = session.state().current_track else {
            return Ok(None);
        };
        session.load_audio_features(&track.id).await?;
        Ok(session.state().audio_features)
    })
    .await
}

/// Connect the playback device and run one transport action.
///
/// # Errors
/// `AuthenticationRequired` without a stored session, `Playback` when no
/// device is available, otherwise the device's error.
pub async fn transport(ctx: &AppContext, action: Transport) -> Result<SessionState> {
    execute_logged(action.command_name(), || async {
        require_session(ctx).await?;
        let session = &ctx.session;
        session.connect_device().await?;

        match action {
            Transport::Play(Some(index)) => session.select_track(index).await?,
            Transport::Play(None) => session.play().await?,
            Transport::Pause => session.pause().await?,
            Transport::Next => session.next().await?,
            Transport::Previous => session.previous().await?,
            Transport::Volume(volume) => session.set_volume(volume).await?,
            Transport::Seek(progress) => session.seek(progress).await?,
        }
        Ok(session.state())
    })
    .await
}

async fn require_session(ctx: &AppContext) -> Result<()> {
    if restore_session(ctx).await? {
        Ok(())
    } else {
        Err(ByDefeatError::AuthenticationRequired)
    }
}
