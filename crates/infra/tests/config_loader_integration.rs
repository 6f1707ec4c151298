//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;
use std::path::PathBuf;

use bydefeat_domain::constants::{DEFAULT_MARKET, DEFAULT_REDIRECT_URI};
use bydefeat_infra::config;
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> (NamedTempFile, PathBuf) {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    (temp_file, path)
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
        [auth]
        client_id = "band-player"
        scopes = ["streaming", "user-read-email"]
        callback_timeout_seconds = 45

        [band]
        artist_name = "By Defeat"
        catalog_limit = 12

        [storage]
        use_keychain = false
        data_dir = "/tmp/bydefeat-integration"
    "#;
    let (_temp, path) = write_config(toml_content, "toml");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load TOML config");

    assert_eq!(config.auth.client_id, "band-player");
    assert_eq!(config.auth.scopes, ["streaming", "user-read-email"]);
    assert_eq!(config.auth.callback_timeout_seconds, 45);
    assert_eq!(config.auth.redirect_uri, DEFAULT_REDIRECT_URI);
    assert_eq!(config.band.catalog_limit, 12);
    assert_eq!(config.api.market, DEFAULT_MARKET);
    assert!(!config.storage.use_keychain);
    assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/bydefeat-integration")));
    config.validate().expect("Loaded config should be valid");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "auth": { "client_id": "band-player" },
        "api": { "base_url": "http://127.0.0.1:9000/v1", "market": "DE" }
    }"#;
    let (_temp, path) = write_config(json_content, "json");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load JSON config");

    assert_eq!(config.api.base_url, "http://127.0.0.1:9000/v1");
    assert_eq!(config.api.market, "DE");
    config.validate().expect("Loaded config should be valid");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_file_without_client_id_fails_validation() {
    let (_temp, path) = write_config("[band]\nartist_name = \"By Defeat\"\n", "toml");

    let config = config::load_from_file(Some(path.clone())).expect("File itself should parse");

    assert!(config.validate().is_err());

    std::fs::remove_file(path).ok();
}
