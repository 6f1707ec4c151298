//! Durable key-value stores
//!
//! Backends for the credential store: the platform keychain and a JSON file
//! in the data directory.

pub mod file;
pub mod keychain;

use std::path::PathBuf;

use bydefeat_domain::constants::STORE_FILE_NAME;
use bydefeat_domain::StorageConfig;

pub use file::JsonFileStore;
pub use keychain::KeychainStore;

/// Directory for the store file: the configured one, else
/// `$XDG_DATA_HOME/bydefeat`, else `~/.local/share/bydefeat`, else the
/// working directory.
pub fn data_dir(config: &StorageConfig) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("bydefeat");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share").join("bydefeat");
    }
    PathBuf::from(".bydefeat")
}

/// Full path of the JSON store file for this configuration.
pub fn store_file_path(config: &StorageConfig) -> PathBuf {
    data_dir(config).join(STORE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_dir_wins() {
        let config = StorageConfig { data_dir: Some(PathBuf::from("/tmp/bd")), ..Default::default() };
        assert_eq!(store_file_path(&config), PathBuf::from("/tmp/bd").join(STORE_FILE_NAME));
    }
}
