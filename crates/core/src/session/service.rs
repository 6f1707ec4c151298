//! Session orchestration
//!
//! Performs the I/O around the reducer: persisting credentials, loading the
//! listener's data after login and driving the playback device. Every
//! outcome is turned into a [`SessionAction`], so the state itself only
//! changes through [`reduce`].
//!
//! Each login starts a new session epoch and logout ends it. A background
//! load only applies its results while its epoch is still current.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bydefeat_common::auth::{AuthError, CredentialRecord, TokenExchange};
use bydefeat_domain::constants::{demo_playlist, BAND_NAME, DEFAULT_CATALOG_LIMIT};
use bydefeat_domain::{BandConfig, ByDefeatError, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::action::SessionAction;
use super::reducer::reduce;
use super::state::SessionState;
use crate::catalog_ports::CatalogProvider;
use crate::playback_ports::PlaybackDevice;

/// Which artist the session loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSettings {
    pub artist_name: String,
    pub catalog_limit: u32,
}

impl Default for BandSettings {
    fn default() -> Self {
        Self { artist_name: BAND_NAME.to_string(), catalog_limit: DEFAULT_CATALOG_LIMIT }
    }
}

impl From<&BandConfig> for BandSettings {
    fn from(config: &BandConfig) -> Self {
        Self { artist_name: config.artist_name.clone(), catalog_limit: config.catalog_limit }
    }
}

/// Owns the session state and publishes every change to subscribers
pub struct SessionService {
    state: watch::Sender<SessionState>,
    epoch: AtomicU64,
    auth: Arc<dyn TokenExchange>,
    catalog: Arc<dyn CatalogProvider>,
    device: Option<Arc<dyn PlaybackDevice>>,
    band: BandSettings,
}

impl SessionService {
    pub fn new(auth: Arc<dyn TokenExchange>, catalog: Arc<dyn CatalogProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            state,
            epoch: AtomicU64::new(0),
            auth,
            catalog,
            device: None,
            band: BandSettings::default(),
        }
    }

    #[must_use]
    pub fn with_playback_device(mut self, device: Arc<dyn PlaybackDevice>) -> Self {
        self.device = Some(device);
        self
    }

    #[must_use]
    pub fn with_band(mut self, band: BandSettings) -> Self {
        self.band = band;
        self
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Apply one action and notify subscribers.
    pub fn dispatch(&self, action: SessionAction) {
        let name = action.name();
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, action);
        });
        trace!(action = name, "Session action applied");
    }

    /// Apply `action` only while `epoch` is the current session.
    ///
    /// The check runs under the state lock, so an action can never land
    /// after the `Logout` that ended its epoch.
    fn dispatch_in(&self, epoch: u64, action: SessionAction) -> ControlFlow<()> {
        let name = action.name();
        let applied = self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::Acquire) != epoch {
                return false;
            }
            let current = std::mem::take(state);
            *state = reduce(current, action);
            true
        });

        if applied {
            trace!(action = name, epoch, "Session action applied");
            ControlFlow::Continue(())
        } else {
            debug!(action = name, epoch, "Session ended, dropping load result");
            ControlFlow::Break(())
        }
    }

    fn begin_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Enter the authenticated state with `record` and start loading the
    /// session data in the background.
    ///
    /// Saving a record that is already stored is a no-op.
    ///
    /// # Errors
    /// Returns `ByDefeatError::Storage` when the record cannot be persisted;
    /// the state is left untouched in that case.
    pub fn authenticate(self: &Arc<Self>, record: &CredentialRecord) -> Result<JoinHandle<()>> {
        self.auth.save_credentials(record).map_err(|err| ByDefeatError::Storage(err.to_string()))?;
        let epoch = self.begin_epoch();
        self.dispatch(SessionAction::Authenticate);
        info!(epoch, expires_at_ms = record.expires_at_epoch_ms, "Session authenticated");

        let service = Arc::clone(self);
        Ok(tokio::spawn(async move { service.load_epoch(epoch).await }))
    }

    /// Pick up a session persisted by an earlier run.
    ///
    /// Expired credentials are refreshed first. Returns `None` when there is
    /// nothing to resume.
    ///
    /// # Errors
    /// Returns `ByDefeatError::Storage` when refreshed credentials cannot be
    /// persisted.
    pub async fn resume(self: &Arc<Self>) -> Result<Option<JoinHandle<()>>> {
        if let Some(record) = self.auth.valid_credentials() {
            return self.authenticate(&record).map(Some);
        }

        match self.auth.refresh().await {
            Ok(_) => {}
            Err(AuthError::NoRefreshToken) => return Ok(None),
            Err(err) => {
                warn!(error = %err, "Stored session could not be refreshed");
                self.auth.clear_credentials();
                return Ok(None);
            }
        }

        match self.auth.valid_credentials() {
            Some(record) => self.authenticate(&record).map(Some),
            None => Ok(None),
        }
    }

    /// Clear every persisted record and return to the initial state.
    ///
    /// A session load still running is abandoned; none of its results are
    /// applied afterwards.
    pub async fn logout(&self) {
        if let Some(device) = &self.device {
            if let Err(err) = device.disconnect().await {
                debug!(error = %err, "Playback device did not disconnect cleanly");
            }
        }
        self.auth.logout();
        let epoch = self.begin_epoch();
        self.dispatch(SessionAction::Logout);
        info!(epoch, "Session logged out");
    }

    /// Load profile, band catalog, saved tracks and any running playback.
    ///
    /// Only an authentication failure stops the sequence (by logging out).
    /// A failed or empty catalog falls back to the demo playlist and records
    /// the error for display. The load belongs to the session that is
    /// current when it starts.
    pub async fn load_session_data(&self) {
        self.load_epoch(self.epoch.load(Ordering::Acquire)).await;
    }

    async fn load_epoch(&self, epoch: u64) {
        if self.dispatch_in(epoch, SessionAction::SetLoading(true)).is_break() {
            return;
        }
        if self.load_steps(epoch).await.is_continue()
            && self.dispatch_in(epoch, SessionAction::SetLoading(false)).is_continue()
        {
            info!(tracks = self.state.borrow().playlist.len(), "Session data loaded");
        }
    }

    async fn load_steps(&self, epoch: u64) -> ControlFlow<()> {
        match self.catalog.current_user().await {
            Ok(profile) => self.dispatch_in(epoch, SessionAction::SetUserProfile(Some(profile)))?,
            Err(err) => self.load_error(epoch, &err).await?,
        }

        match self.catalog.band_tracks(&self.band.artist_name, self.band.catalog_limit).await {
            Ok(tracks) if !tracks.is_empty() => {
                debug!(count = tracks.len(), "Band catalog loaded");
                self.dispatch_in(epoch, SessionAction::SetPlaylist(tracks))?;
            }
            Ok(_) => self.fall_back_to_demo(
                epoch,
                &ByDefeatError::CatalogUnavailable(format!(
                    "no tracks found for {}",
                    self.band.artist_name
                )),
            )?,
            Err(err) if err.forces_logout() => self.load_error(epoch, &err).await?,
            Err(err) => self.fall_back_to_demo(epoch, &err)?,
        }

        match self.catalog.saved_tracks(self.band.catalog_limit).await {
            Ok(tracks) => self.dispatch_in(epoch, SessionAction::SetSavedTracks(tracks))?,
            Err(err) if err.forces_logout() => self.load_error(epoch, &err).await?,
            Err(err) => warn!(error = %err, "Saved tracks unavailable"),
        }

        match self.catalog.playback_state().await {
            Ok(Some(snapshot)) if snapshot.track.is_some() => {
                debug!(paused = snapshot.paused, "Syncing with active playback");
                let progress = snapshot.progress_percent();
                self.dispatch_in(epoch, SessionAction::SetCurrentTrack(snapshot.track))?;
                self.dispatch_in(epoch, SessionAction::SetProgress(progress))?;
                self.dispatch_in(epoch, SessionAction::SetPlaying(!snapshot.paused))?;
            }
            Ok(_) => {}
            Err(err) if err.forces_logout() => self.load_error(epoch, &err).await?,
            Err(err) => debug!(error = %err, "Playback state unavailable"),
        }

        ControlFlow::Continue(())
    }

    fn fall_back_to_demo(&self, epoch: u64, err: &ByDefeatError) -> ControlFlow<()> {
        warn!(error = %err, "Band catalog unavailable, using demo playlist");
        self.dispatch_in(epoch, SessionAction::SetPlaylist(demo_playlist()))?;
        self.dispatch_in(epoch, SessionAction::SetError(Some(err.to_string())))
    }

    /// Error policy for a load step; a load from an ended session must not
    /// log out the session that replaced it.
    async fn load_error(&self, epoch: u64, err: &ByDefeatError) -> ControlFlow<()> {
        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!(error = %err, epoch, "Session ended, ignoring load error");
            return ControlFlow::Break(());
        }
        if err.forces_logout() {
            return self.handle_error(err).await;
        }
        log_recorded_error(err);
        self.dispatch_in(epoch, SessionAction::SetError(Some(err.to_string())))
    }

    /// Apply the session-wide error policy.
    ///
    /// `AuthenticationRequired` ends the session; anything else, including
    /// `InsufficientPermissions`, is recorded for display.
    async fn handle_error(&self, err: &ByDefeatError) -> ControlFlow<()> {
        if err.forces_logout() {
            warn!(error = %err, "Session is no longer authorized, logging out");
            self.logout().await;
            return ControlFlow::Break(());
        }
        log_recorded_error(err);
        self.dispatch(SessionAction::SetError(Some(err.to_string())));
        ControlFlow::Continue(())
    }

    async fn checked<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            let _ = self.handle_error(err).await;
        }
        result
    }

    fn require_authenticated(&self) -> Result<()> {
        if self.state.borrow().is_authenticated() {
            Ok(())
        } else {
            Err(ByDefeatError::AuthenticationRequired)
        }
    }

    /// Device to drive, only while authenticated.
    fn active_device(&self) -> Option<&Arc<dyn PlaybackDevice>> {
        self.device.as_ref().filter(|_| self.state.borrow().is_authenticated())
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Start or resume the current track.
    ///
    /// # Errors
    /// `AuthenticationRequired` while logged out, or the device's error.
    pub async fn play(&self) -> Result<()> {
        self.require_authenticated()?;
        if let Some(device) = self.active_device() {
            let current = self.state.borrow().current_track.clone();
            let remote = self.checked(device.current_state().await).await?;
            let remote_id = remote.and_then(|s| s.track).map(|t| t.id);
            match current {
                Some(track) if remote_id.as_deref() != Some(track.id.as_str()) => {
                    self.checked(device.play_uri(&track.uri).await).await?;
                }
                _ => self.checked(device.resume().await).await?,
            }
        }
        self.dispatch(SessionAction::SetPlaying(true));
        Ok(())
    }

    /// # Errors
    /// The device's error; the local state is paused regardless.
    pub async fn pause(&self) -> Result<()> {
        self.dispatch(SessionAction::SetPlaying(false));
        if let Some(device) = self.active_device() {
            self.checked(device.pause().await).await?;
        }
        Ok(())
    }

    /// # Errors
    /// See [`Self::play`] and [`Self::pause`].
    pub async fn toggle(&self) -> Result<()> {
        let playing = self.state.borrow().is_playing;
        if playing {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Advance to the next playlist entry, wrapping at the end.
    ///
    /// # Errors
    /// The device's error when it cannot start the new track.
    pub async fn next(&self) -> Result<()> {
        if self.state.borrow().playlist.is_empty() {
            if let Some(device) = self.active_device() {
                self.checked(device.next_track().await).await?;
            }
            return Ok(());
        }
        self.dispatch(SessionAction::NextTrack);
        self.restart_if_playing().await
    }

    /// Step back to the previous playlist entry, wrapping at the start.
    ///
    /// # Errors
    /// The device's error when it cannot start the new track.
    pub async fn previous(&self) -> Result<()> {
        if self.state.borrow().playlist.is_empty() {
            if let Some(device) = self.active_device() {
                self.checked(device.previous_track().await).await?;
            }
            return Ok(());
        }
        self.dispatch(SessionAction::PreviousTrack);
        self.restart_if_playing().await
    }

    /// Select a playlist entry and play it.
    ///
    /// # Errors
    /// `Playback` when `index` is outside the playlist, otherwise as
    /// [`Self::play`].
    pub async fn select_track(&self, index: usize) -> Result<()> {
        let len = self.state.borrow().playlist.len();
        if index >= len {
            return Err(ByDefeatError::Playback(format!(
                "no track at index {index} (playlist has {len})"
            )));
        }
        self.dispatch(SessionAction::SetCurrentIndex(index));
        self.play().await
    }

    async fn restart_if_playing(&self) -> Result<()> {
        let (playing, uri) = {
            let state = self.state.borrow();
            (state.is_playing, state.current_track.as_ref().map(|t| t.uri.clone()))
        };
        if let (true, Some(uri), Some(device)) = (playing, uri, self.active_device()) {
            self.checked(device.play_uri(&uri).await).await?;
        }
        Ok(())
    }

    /// # Errors
    /// The device's error.
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        self.dispatch(SessionAction::SetVolume(volume));
        if let Some(device) = self.active_device() {
            let volume = self.state.borrow().volume;
            self.checked(device.set_volume(volume).await).await?;
        }
        Ok(())
    }

    /// Jump to `progress` percent of the current track.
    ///
    /// # Errors
    /// The device's error.
    pub async fn seek(&self, progress: f32) -> Result<()> {
        self.dispatch(SessionAction::SetProgress(progress));
        if let Some(device) = self.active_device() {
            let position_ms = self.state.borrow().position_ms();
            self.checked(device.seek(position_ms).await).await?;
        }
        Ok(())
    }

    /// Attach the playback device and push the current volume to it.
    ///
    /// # Errors
    /// `AuthenticationRequired` while logged out, `Playback` when no device
    /// is configured, otherwise the device's error.
    pub async fn connect_device(&self) -> Result<String> {
        self.require_authenticated()?;
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| ByDefeatError::Playback("no playback device configured".to_string()))?;

        let device_id = self.checked(device.connect().await).await?;
        self.dispatch(SessionAction::SetDevice(Some(device_id.clone())));
        info!(device_id = %device_id, "Playback device connected");

        let volume = self.state.borrow().volume;
        self.checked(device.set_volume(volume).await).await?;
        Ok(device_id)
    }

    /// Fetch audio features for `track_id`.
    ///
    /// Features that arrive after the listener moved to another track are
    /// dropped.
    ///
    /// # Errors
    /// The catalog's error.
    pub async fn load_audio_features(&self, track_id: &str) -> Result<()> {
        let features = self.checked(self.catalog.audio_features(track_id).await).await?;

        let still_current = self
            .state
            .borrow()
            .current_track
            .as_ref()
            .is_some_and(|track| track.id == track_id);
        if still_current {
            self.dispatch(SessionAction::SetAudioFeatures(Some(features)));
        } else {
            debug!(track_id, "Discarding audio features for a track no longer playing");
        }
        Ok(())
    }
}

fn log_recorded_error(err: &ByDefeatError) {
    if err.needs_reauthentication() {
        warn!(error = %err, "Granted scopes do not cover the request, login again to fix");
    } else {
        debug!(error = %err, "Session error recorded");
    }
}
