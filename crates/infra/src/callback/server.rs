//! Loopback HTTP listener for the OAuth redirect
//!
//! Serves `GET <redirect path>` on the host and port of the configured
//! redirect URI, hands the full redirect URL to a [`CallbackHandler`] and
//! renders the outcome as a small HTML page.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use bydefeat_core::{CallbackHandler, CallbackState};
use bydefeat_domain::{ByDefeatError, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

struct RouteState {
    handler: Arc<CallbackHandler>,
    /// `http://host:port` the listener is reachable on
    origin: String,
}

/// Loopback server that receives the authorization redirect
pub struct CallbackServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind to the host and port of `redirect_uri` and start serving.
    ///
    /// # Errors
    /// `Config` if the redirect URI is not an `http` loopback URL, `Network`
    /// if the port cannot be bound.
    pub async fn start(redirect_uri: &str, handler: Arc<CallbackHandler>) -> Result<Self> {
        let (bind_addr, path) = loopback_target(redirect_uri)?;

        let listener = TcpListener::bind(&bind_addr).await.map_err(|err| {
            ByDefeatError::Network(format!("failed to bind OAuth loopback server on {bind_addr}: {err}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| ByDefeatError::Network(format!("failed to determine port: {err}")))?;

        let app = router(handler, &path, format!("http://{local_addr}"));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("OAuth callback server error: {}", err);
            }
        });

        info!(addr = %local_addr, path = %path, "OAuth callback server listening");
        Ok(Self { local_addr, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shut down the loopback server gracefully.
    ///
    /// # Errors
    /// Returns `Internal` if the server task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(ByDefeatError::Internal(format!(
                        "OAuth callback server panicked: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

/// Router serving the redirect at `path`. `origin` is prefixed to the request
/// URI to rebuild the full redirect URL.
pub fn router(handler: Arc<CallbackHandler>, path: &str, origin: String) -> Router {
    Router::new()
        .route(path, get(handle_redirect))
        .with_state(Arc::new(RouteState { handler, origin }))
}

/// Socket address and route path for a loopback redirect URI.
fn loopback_target(redirect_uri: &str) -> Result<(String, String)> {
    let url = Url::parse(redirect_uri)
        .map_err(|err| ByDefeatError::Config(format!("invalid redirect URI: {err}")))?;
    if url.scheme() != "http" {
        return Err(ByDefeatError::Config("redirect URI must use http on loopback".into()));
    }

    let host = match url.host_str() {
        Some("localhost" | "127.0.0.1") => "127.0.0.1",
        Some("[::1]") => "[::1]",
        other => {
            return Err(ByDefeatError::Config(format!(
                "redirect URI host must be loopback, got {}",
                other.unwrap_or("none")
            )))
        }
    };
    let port = url.port_or_known_default().unwrap_or(80);

    Ok((format!("{host}:{port}"), url.path().to_string()))
}

async fn handle_redirect(
    State(state): State<Arc<RouteState>>,
    uri: Uri,
) -> (StatusCode, Html<String>) {
    let redirect_url = format!("{}{}", state.origin, uri);
    let outcome = state.handler.handle(&redirect_url).await;
    render(&outcome)
}

fn render(outcome: &CallbackState) -> (StatusCode, Html<String>) {
    let (status, title, message) = match outcome {
        CallbackState::Success => (
            StatusCode::OK,
            "Authorization Successful",
            "You are logged in. You can close this window.".to_string(),
        ),
        CallbackState::Idle | CallbackState::Exchanging => (
            StatusCode::OK,
            "Authorization In Progress",
            "Login is already being completed in another tab.".to_string(),
        ),
        CallbackState::Error(failure) => {
            let hint = if failure.requires_new_login() { " Please start the login again." } else { "" };
            (StatusCode::BAD_REQUEST, "Authorization Failed", format!("{failure}.{hint}"))
        }
        CallbackState::TimedOut => (
            StatusCode::GATEWAY_TIMEOUT,
            "Authorization Timed Out",
            "The authorization server did not answer in time. Please try again.".to_string(),
        ),
    };

    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body><h1>{title}</h1><p>{}</p></body>\n</html>",
        escape_html(&message)
    );
    (status, Html(page))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
