//! Callback handler
//!
//! Turns the authorization server's redirect into a session:
//!
//! ```text
//! Idle ──► Exchanging ──► Success
//!   │           ├──────► Error(reason)
//!   │           └──────► TimedOut
//!   ├──► Success        (no code, credentials still valid)
//!   └──► Error(reason)  (server error, missing code)
//! ```
//!
//! A handler serves one redirect. Any invocation after the first is a no-op
//! that reports the current state, since the authorization code can be
//! redeemed only once.
//!
//! The pending handshake is deleted on timeout and on every failure that
//! needs a new login. State mismatches and rejected exchanges keep it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bydefeat_common::auth::{AuthError, CredentialRecord, TokenExchange};
use bydefeat_domain::constants::CALLBACK_TIMEOUT_SECS;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::params::RedirectParams;
use crate::session::{SessionAction, SessionService};

/// How long to wait for the code exchange.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(CALLBACK_TIMEOUT_SECS);

/// Why a callback did not produce a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackFailure {
    /// The authorization server redirected with `error=...`.
    #[error("Authorization server returned {error}")]
    AuthServer { error: String, description: Option<String> },

    #[error("Redirect carried no authorization code")]
    MissingCode,

    #[error(transparent)]
    Exchange(AuthError),

    #[error("Invalid redirect URL: {0}")]
    InvalidRedirect(String),

    /// Credentials were obtained but the session could not take them.
    #[error("Could not start session: {0}")]
    Session(String),

    #[error("Code exchange stopped unexpectedly: {0}")]
    Interrupted(String),
}

impl CallbackFailure {
    /// Whether the user has to begin a new login to recover.
    #[must_use]
    pub const fn requires_new_login(&self) -> bool {
        match self {
            Self::Exchange(err) => !err.handshake_retained(),
            Self::Session(_) | Self::Interrupted(_) => false,
            Self::AuthServer { .. } | Self::MissingCode | Self::InvalidRedirect(_) => true,
        }
    }
}

/// Progress of one redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackState {
    Idle,
    Exchanging,
    Success,
    Error(CallbackFailure),
    TimedOut,
}

impl CallbackState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_) | Self::TimedOut)
    }
}

/// Handles the redirect back from the authorization server
pub struct CallbackHandler {
    exchanger: Arc<dyn TokenExchange>,
    session: Arc<SessionService>,
    timeout: Duration,
    state: watch::Sender<CallbackState>,
    in_progress: AtomicBool,
    session_load: Mutex<Option<JoinHandle<()>>>,
}

impl CallbackHandler {
    pub fn new(exchanger: Arc<dyn TokenExchange>, session: Arc<SessionService>) -> Self {
        let (state, _) = watch::channel(CallbackState::Idle);
        Self {
            exchanger,
            session,
            timeout: DEFAULT_CALLBACK_TIMEOUT,
            state,
            in_progress: AtomicBool::new(false),
            session_load: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn state(&self) -> CallbackState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CallbackState> {
        self.state.subscribe()
    }

    /// Background session load started on success, if any.
    pub fn take_session_load(&self) -> Option<JoinHandle<()>> {
        self.session_load.lock().take()
    }

    /// Process the redirect URL and return the resulting state.
    pub async fn handle(&self, redirect_url: &str) -> CallbackState {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            debug!("Callback already in progress, ignoring duplicate invocation");
            return self.state();
        }

        let outcome = self.run(redirect_url).await;
        match &outcome {
            CallbackState::Error(failure) => {
                warn!(error = %failure, "Login callback failed");
                if failure.requires_new_login() {
                    self.exchanger.abandon_login();
                }
                self.session.dispatch(SessionAction::SetAuthError(failure.to_string()));
            }
            CallbackState::TimedOut => {
                warn!(timeout_secs = self.timeout.as_secs(), "Login callback timed out");
                self.exchanger.abandon_login();
                self.session
                    .dispatch(SessionAction::SetAuthError("Authentication timed out".to_string()));
            }
            _ => info!("Login callback completed"),
        }
        self.state.send_replace(outcome.clone());
        outcome
    }

    async fn run(&self, redirect_url: &str) -> CallbackState {
        let params = match RedirectParams::parse(redirect_url) {
            Ok(params) => params,
            Err(failure) => return CallbackState::Error(failure),
        };

        if let Some(error) = params.error {
            return CallbackState::Error(CallbackFailure::AuthServer {
                error,
                description: params.error_description,
            });
        }

        let Some(code) = params.code else {
            return match self.exchanger.valid_credentials() {
                Some(record) => {
                    debug!("Redirect without code, reusing stored credentials");
                    self.start_session(&record)
                }
                None => CallbackState::Error(CallbackFailure::MissingCode),
            };
        };

        self.state.send_replace(CallbackState::Exchanging);
        self.session.dispatch(SessionAction::SetAuthenticating);

        // The exchange runs in its own task so a timeout only stops the wait;
        // a late result is dropped with the detached handle.
        let exchanger = Arc::clone(&self.exchanger);
        let redirect_state = params.state;
        let exchange = tokio::spawn(async move {
            exchanger.exchange_authorization_code(&code, redirect_state.as_deref()).await
        });

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(Ok(record))) => self.start_session(&record),
            Ok(Ok(Err(err))) => {
                self.exchanger.clear_credentials();
                CallbackState::Error(CallbackFailure::Exchange(err))
            }
            Ok(Err(join_err)) => {
                CallbackState::Error(CallbackFailure::Interrupted(join_err.to_string()))
            }
            Err(_) => CallbackState::TimedOut,
        }
    }

    fn start_session(&self, record: &CredentialRecord) -> CallbackState {
        match self.session.authenticate(record) {
            Ok(load) => {
                *self.session_load.lock() = Some(load);
                CallbackState::Success
            }
            Err(err) => CallbackState::Error(CallbackFailure::Session(err.to_string())),
        }
    }
}
