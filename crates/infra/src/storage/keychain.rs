//! Platform keychain store
//!
//! One keychain entry per key, all under a single service name. Used as the
//! primary credential store on desktop platforms.

use bydefeat_common::storage::{KeyValueStore, StorageError, StorageResult};
use keyring::Entry;
use tracing::debug;

/// [`KeyValueStore`] over the OS keychain (Keychain, Secret Service,
/// Credential Manager)
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> StorageResult<Entry> {
        Entry::new(&self.service_name, key).map_err(map_keyring_error)
    }
}

impl KeyValueStore for KeychainStore {
    fn name(&self) -> &str {
        "keychain"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entry(key)?.set_password(value).map_err(map_keyring_error)?;
        debug!(service = %self.service_name, key = %key, "Keychain entry stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        }
    }
}

/* keyring::Error → StorageError */
fn map_keyring_error(err: keyring::Error) -> StorageError {
    match err {
        keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
            StorageError::Unavailable(err.to_string())
        }
        other => StorageError::Keychain(other.to_string()),
    }
}
