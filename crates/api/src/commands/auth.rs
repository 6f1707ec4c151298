//! Login, session restore and logout commands

use std::time::Duration;

use bydefeat_core::{CallbackHandler, CallbackState, SessionState};
use bydefeat_domain::{ByDefeatError, Result};
use bydefeat_infra::CallbackServer;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::utils::execute_logged;

/// Run the full browser login.
///
/// Starts the loopback listener, passes the authorization URL to `open_url`
/// and waits until the redirect has been handled or the handshake expires.
/// A successful login also waits for the session data to load.
///
/// # Errors
/// `AuthenticationRequired` when no redirect arrives before the handshake
/// expires, `Config` or `Network` when the listener cannot start.
pub async fn login(ctx: &AppContext, open_url: impl FnOnce(&str)) -> Result<CallbackState> {
    execute_logged("auth::login", move || async move {
        let url = ctx.auth.start_login().map_err(|err| ByDefeatError::Storage(err.to_string()))?;

        let handler = ctx.callback_handler();
        let server = CallbackServer::start(&ctx.config.auth.redirect_uri, handler.clone()).await?;
        open_url(&url);

        let outcome = wait_for_redirect(&handler, ctx.config.auth.handshake_ttl()).await;
        server.shutdown().await?;

        let Some(state) = outcome else {
            warn!("No authorization redirect received before the handshake expired");
            return Err(ByDefeatError::AuthenticationRequired);
        };

        if state == CallbackState::Success {
            if let Some(load) = handler.take_session_load() {
                join_session_load(load).await?;
            }
        }
        Ok(state)
    })
    .await
}

/// Resume a session persisted by an earlier run and wait for its data.
///
/// Returns whether a session was restored.
///
/// # Errors
/// `Storage` when refreshed credentials cannot be persisted.
pub async fn restore_session(ctx: &AppContext) -> Result<bool> {
    execute_logged("auth::restore_session", || async {
        match ctx.session.resume().await? {
            Some(load) => {
                join_session_load(load).await?;
                Ok(ctx.session.state().is_authenticated())
            }
            None => Ok(false),
        }
    })
    .await
}

/// Restore any session and report its state.
///
/// # Errors
/// See [`restore_session`].
pub async fn status(ctx: &AppContext) -> Result<SessionState> {
    restore_session(ctx).await?;
    Ok(ctx.session.state())
}

/// Forget every stored credential and handshake.
pub async fn logout(ctx: &AppContext) {
    ctx.session.logout().await;
    info!("Logged out");
}

/// First terminal callback state, or `None` if `limit` passes first.
async fn wait_for_redirect(handler: &CallbackHandler, limit: Duration) -> Option<CallbackState> {
    let mut updates = handler.subscribe();
    let wait = async {
        loop {
            let state = updates.borrow_and_update().clone();
            if state.is_terminal() {
                return Some(state);
            }
            if updates.changed().await.is_err() {
                return None;
            }
        }
    };
    tokio::time::timeout(limit, wait).await.ok().flatten()
}

async fn join_session_load(load: JoinHandle<()>) -> Result<()> {
    load.await.map_err(|err| ByDefeatError::Internal(format!("session load failed: {err}")))
}
