//! Credential store
//!
//! The only component that touches durable storage. Two record kinds are
//! kept as plain string pairs:
//!
//! | key                          | record     |
//! |------------------------------|------------|
//! | `handshake.code_verifier`    | handshake  |
//! | `handshake.csrf_state`       | handshake  |
//! | `handshake.created_at_ms`    | handshake  |
//! | `credentials.access_token`   | credential |
//! | `credentials.refresh_token`  | credential |
//! | `credentials.expires_at_ms`  | credential |
//!
//! The handshake must survive the redirect to the authorization server and
//! back, so it is written to both stores and read from whichever has it.
//! Credentials live in the primary store only.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::AuthError;
use super::types::{CredentialRecord, HandshakeRecord};
use crate::storage::{KeyValueStore, StorageError, StorageResult};
use crate::time::Clock;

/// Persisted key names
pub mod keys {
    pub const HANDSHAKE_CODE_VERIFIER: &str = "handshake.code_verifier";
    pub const HANDSHAKE_CSRF_STATE: &str = "handshake.csrf_state";
    pub const HANDSHAKE_CREATED_AT_MS: &str = "handshake.created_at_ms";
    pub const CREDENTIALS_ACCESS_TOKEN: &str = "credentials.access_token";
    pub const CREDENTIALS_REFRESH_TOKEN: &str = "credentials.refresh_token";
    pub const CREDENTIALS_EXPIRES_AT_MS: &str = "credentials.expires_at_ms";

    pub const HANDSHAKE: [&str; 3] =
        [HANDSHAKE_CODE_VERIFIER, HANDSHAKE_CSRF_STATE, HANDSHAKE_CREATED_AT_MS];
    pub const CREDENTIALS: [&str; 3] =
        [CREDENTIALS_ACCESS_TOKEN, CREDENTIALS_REFRESH_TOKEN, CREDENTIALS_EXPIRES_AT_MS];
}

/// Reads and writes handshake and credential records
pub struct CredentialStore {
    primary: Arc<dyn KeyValueStore>,
    secondary: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    /// `primary` is the canonical store for credentials; `secondary` is the
    /// handshake fallback.
    pub fn new(
        primary: Arc<dyn KeyValueStore>,
        secondary: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { primary, secondary, clock }
    }

    /// Current time according to the store's clock.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.millis_since_epoch()
    }

    fn stores(&self) -> [&dyn KeyValueStore; 2] {
        [self.primary.as_ref(), self.secondary.as_ref()]
    }

    // ------------------------------------------------------------------
    // Handshake
    // ------------------------------------------------------------------

    /// Persist the handshake to every store that accepts it.
    ///
    /// # Errors
    /// Returns `AuthError::StorageUnavailable` only when both stores fail.
    pub fn save_handshake(&self, record: &HandshakeRecord) -> Result<(), AuthError> {
        let mut failures = Vec::new();
        for store in self.stores() {
            if let Err(err) = write_handshake(store, record) {
                warn!(store = store.name(), error = %err, "Failed to persist login handshake");
                // Leave no partial record behind in this store.
                let _ = remove_keys(store, &keys::HANDSHAKE);
                failures.push(format!("{}: {err}", store.name()));
            }
        }

        if failures.len() == 2 {
            return Err(AuthError::StorageUnavailable(failures.join("; ")));
        }
        debug!(written = 2 - failures.len(), "Login handshake persisted");
        Ok(())
    }

    /// Load the handshake from the primary store, falling back to the
    /// secondary. Does not delete it.
    #[must_use]
    pub fn load_handshake(&self) -> Option<HandshakeRecord> {
        for store in self.stores() {
            match read_handshake(store) {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(err) => {
                    warn!(store = store.name(), error = %err, "Failed to read login handshake");
                }
            }
        }
        None
    }

    /// Delete the handshake from every store.
    pub fn clear_handshake(&self) {
        for store in self.stores() {
            if let Err(err) = remove_keys(store, &keys::HANDSHAKE) {
                warn!(store = store.name(), error = %err, "Failed to clear login handshake");
            }
        }
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// Persist credentials to the primary store.
    ///
    /// # Errors
    /// Returns `AuthError::StorageUnavailable` if the primary store rejects
    /// the write.
    pub fn save_credentials(&self, record: &CredentialRecord) -> Result<(), AuthError> {
        let store = self.primary.as_ref();
        write_credentials(store, record).map_err(|err| {
            warn!(store = store.name(), error = %err, "Failed to persist credentials");
            AuthError::StorageUnavailable(format!("{}: {err}", store.name()))
        })
    }

    /// Load credentials that are still valid now.
    ///
    /// Returns `None` once `expires_at_epoch_ms` has passed, even though the
    /// record is still on disk (its refresh token stays readable through
    /// [`Self::load_refresh_token`]).
    #[must_use]
    pub fn load_credentials(&self) -> Option<CredentialRecord> {
        let record = self.read_credentials()?;
        if record.is_expired_at(self.now_ms()) {
            debug!(expires_at_ms = record.expires_at_epoch_ms, "Stored access token has expired");
            return None;
        }
        Some(record)
    }

    /// Refresh token regardless of whether the access token has expired.
    #[must_use]
    pub fn load_refresh_token(&self) -> Option<String> {
        let store = self.primary.as_ref();
        match store.get(keys::CREDENTIALS_REFRESH_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(store = store.name(), error = %err, "Failed to read refresh token");
                None
            }
        }
    }

    /// Delete the credential record.
    pub fn clear_credentials(&self) {
        let store = self.primary.as_ref();
        if let Err(err) = remove_keys(store, &keys::CREDENTIALS) {
            warn!(store = store.name(), error = %err, "Failed to clear credentials");
        }
    }

    /// Delete both handshake and credential records.
    pub fn clear_all(&self) {
        self.clear_handshake();
        self.clear_credentials();
    }

    fn read_credentials(&self) -> Option<CredentialRecord> {
        let store = self.primary.as_ref();
        match read_credentials(store) {
            Ok(record) => record,
            Err(err) => {
                warn!(store = store.name(), error = %err, "Failed to read credentials");
                None
            }
        }
    }
}

fn write_handshake(store: &dyn KeyValueStore, record: &HandshakeRecord) -> StorageResult<()> {
    store.set(keys::HANDSHAKE_CODE_VERIFIER, &record.code_verifier)?;
    store.set(keys::HANDSHAKE_CSRF_STATE, &record.csrf_state)?;
    store.set(keys::HANDSHAKE_CREATED_AT_MS, &record.created_at_epoch_ms.to_string())
}

fn read_handshake(store: &dyn KeyValueStore) -> StorageResult<Option<HandshakeRecord>> {
    let verifier = store.get(keys::HANDSHAKE_CODE_VERIFIER)?;
    let state = store.get(keys::HANDSHAKE_CSRF_STATE)?;
    let created_at = store.get(keys::HANDSHAKE_CREATED_AT_MS)?;

    let (Some(code_verifier), Some(csrf_state), Some(created_at)) = (verifier, state, created_at)
    else {
        return Ok(None);
    };

    Ok(Some(HandshakeRecord {
        code_verifier,
        csrf_state,
        created_at_epoch_ms: parse_millis(keys::HANDSHAKE_CREATED_AT_MS, &created_at)?,
    }))
}

fn write_credentials(store: &dyn KeyValueStore, record: &CredentialRecord) -> StorageResult<()> {
    store.set(keys::CREDENTIALS_ACCESS_TOKEN, &record.access_token)?;
    store.set(keys::CREDENTIALS_EXPIRES_AT_MS, &record.expires_at_epoch_ms.to_string())?;
    match &record.refresh_token {
        Some(token) => store.set(keys::CREDENTIALS_REFRESH_TOKEN, token),
        None => store.remove(keys::CREDENTIALS_REFRESH_TOKEN),
    }
}

fn read_credentials(store: &dyn KeyValueStore) -> StorageResult<Option<CredentialRecord>> {
    let Some(access_token) = store.get(keys::CREDENTIALS_ACCESS_TOKEN)? else {
        return Ok(None);
    };
    let Some(expires_at) = store.get(keys::CREDENTIALS_EXPIRES_AT_MS)? else {
        return Ok(None);
    };
    let expires_at_epoch_ms = parse_millis(keys::CREDENTIALS_EXPIRES_AT_MS, &expires_at)?;
    if access_token.is_empty() || expires_at_epoch_ms == 0 {
        return Ok(None);
    }

    Ok(Some(CredentialRecord {
        access_token,
        refresh_token: store.get(keys::CREDENTIALS_REFRESH_TOKEN)?.filter(|t| !t.is_empty()),
        expires_at_epoch_ms,
    }))
}

fn remove_keys(store: &dyn KeyValueStore, keys: &[&str]) -> StorageResult<()> {
    let mut first_error = None;
    for key in keys {
        if let Err(err) = store.remove(key) {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, StorageError> {
    raw.trim().parse::<u64>().map_err(|err| StorageError::invalid_value(key, err))
}
