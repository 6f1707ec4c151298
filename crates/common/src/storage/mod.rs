//! Key-value storage primitives
//!
//! Credentials and the PKCE handshake are persisted as plain string pairs.
//! [`KeyValueStore`] is the seam every backend implements: the in-memory
//! store here, and the keychain and JSON-file stores in the infra crate.

pub mod error;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;

/// A durable (or session-scoped) string key-value store
///
/// Implementations are synchronous: every backend in use is a local
/// keychain or file, and callers hold no locks across these calls.
pub trait KeyValueStore: Send + Sync {
    /// Short backend name used in log fields.
    fn name(&self) -> &str;

    /// Read a value. A missing key is `Ok(None)`, not an error.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error when the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value. Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns an error when the backend rejects the delete.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Whether a value exists under `key`.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be read.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
