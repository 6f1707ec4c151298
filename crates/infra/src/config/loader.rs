//! Configuration loader
//!
//! Builds the application configuration from defaults, an optional file and
//! environment variables.
//!
//! ## Loading Strategy
//! 1. Load a `.env` file into the environment if one exists
//! 2. Start from the file named by `BYDEFEAT_CONFIG`, else the first file
//!    found by [`probe_config_paths`], else the built-in defaults
//! 3. Override individual settings from `BYDEFEAT_*` variables
//! 4. Validate
//!
//! ## Environment Variables
//! - `BYDEFEAT_CONFIG`: Explicit config file path
//! - `BYDEFEAT_CLIENT_ID`: Public OAuth client id (required somewhere)
//! - `BYDEFEAT_REDIRECT_URI`: Loopback redirect URI
//! - `BYDEFEAT_SCOPES`: Requested scopes, space or comma separated
//! - `BYDEFEAT_AUTHORIZE_URL` / `BYDEFEAT_TOKEN_URL`: Authorization server
//! - `BYDEFEAT_HANDSHAKE_TTL_SECS`: Age after which a login handshake is refused
//! - `BYDEFEAT_CALLBACK_TIMEOUT_SECS`: Code exchange timeout
//! - `BYDEFEAT_API_BASE_URL`: Catalog API base URL
//! - `BYDEFEAT_REQUEST_TIMEOUT_SECS`: Per-request timeout
//! - `BYDEFEAT_MARKET`: Market for top-tracks lookups
//! - `BYDEFEAT_ARTIST_NAME` / `BYDEFEAT_CATALOG_LIMIT`: Band catalog
//! - `BYDEFEAT_DATA_DIR`: Directory for the JSON store file
//! - `BYDEFEAT_KEYCHAIN_SERVICE`: Keychain service name
//! - `BYDEFEAT_USE_KEYCHAIN`: Whether the keychain is the primary store
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./bydefeat.toml` or `./bydefeat.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bydefeat_domain::{ByDefeatError, Config, Result};

const ENV_PREFIX: &str = "BYDEFEAT_";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["bydefeat.toml", "bydefeat.json", "config.toml", "config.json"];

/// Load and validate configuration
///
/// # Errors
/// Returns `ByDefeatError::Config` if:
/// - The explicit config file is missing or unreadable
/// - A file or variable has an invalid value
/// - The result fails [`Config::validate`] (e.g. no client id)
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    let explicit = std::env::var_os(format!("{ENV_PREFIX}CONFIG")).map(PathBuf::from);
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env(&mut config)?;
    config.validate()?;

    tracing::info!(
        api = %config.api.base_url,
        artist = %config.band.artist_name,
        keychain = config.storage.use_keychain,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Missing settings keep
/// their defaults.
///
/// # Errors
/// Returns `ByDefeatError::Config` if no file is found, it cannot be read, or
/// its format is invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ByDefeatError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ByDefeatError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ByDefeatError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Override settings from `BYDEFEAT_*` environment variables
///
/// # Errors
/// Returns `ByDefeatError::Config` if a numeric variable does not parse.
pub fn apply_env(config: &mut Config) -> Result<()> {
    let auth = &mut config.auth;
    set_string("CLIENT_ID", &mut auth.client_id);
    set_string("REDIRECT_URI", &mut auth.redirect_uri);
    set_string("AUTHORIZE_URL", &mut auth.authorize_url);
    set_string("TOKEN_URL", &mut auth.token_url);
    if let Some(scopes) = env_string("SCOPES") {
        auth.scopes = scopes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
    }
    set_parsed("HANDSHAKE_TTL_SECS", &mut auth.handshake_ttl_seconds)?;
    set_parsed("CALLBACK_TIMEOUT_SECS", &mut auth.callback_timeout_seconds)?;

    let api = &mut config.api;
    set_string("API_BASE_URL", &mut api.base_url);
    set_string("MARKET", &mut api.market);
    set_parsed("REQUEST_TIMEOUT_SECS", &mut api.request_timeout_seconds)?;

    set_string("ARTIST_NAME", &mut config.band.artist_name);
    set_parsed("CATALOG_LIMIT", &mut config.band.catalog_limit)?;

    let storage = &mut config.storage;
    if let Some(dir) = env_string("DATA_DIR") {
        storage.data_dir = Some(PathBuf::from(dir));
    }
    set_string("KEYCHAIN_SERVICE", &mut storage.keychain_service);
    storage.use_keychain = env_bool(&format!("{ENV_PREFIX}USE_KEYCHAIN"), storage.use_keychain);

    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ByDefeatError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ByDefeatError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ByDefeatError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ByDefeatError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Non-empty value of `BYDEFEAT_<key>`
fn env_string(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok().filter(|v| !v.trim().is_empty())
}

fn set_string(key: &str, target: &mut String) {
    if let Some(value) = env_string(key) {
        *target = value;
    }
}

fn set_parsed<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = env_string(key) {
        *target = value.trim().parse().map_err(|e| {
            ByDefeatError::Config(format!("Invalid value for {ENV_PREFIX}{key}: {e}"))
        })?;
    }
    Ok(())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
