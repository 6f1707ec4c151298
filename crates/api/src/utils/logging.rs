use std::time::Duration;

use bydefeat_domain::ByDefeatError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,bydefeat=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. With `json` set, events are
/// emitted as one JSON object per line.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let result = if json { builder.json().try_init() } else { builder.compact().try_init() };
    if result.is_err() {
        warn!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&ByDefeatError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => warn!(
            command,
            duration_ms,
            error_type = error_label(err),
            error = %err,
            "command_execution_failure"
        ),
    }
}

/// Convert a `ByDefeatError` into a stable label suitable for logging.
#[inline]
pub const fn error_label(error: &ByDefeatError) -> &'static str {
    match error {
        ByDefeatError::AuthenticationRequired => "authentication_required",
        ByDefeatError::InsufficientPermissions => "insufficient_permissions",
        ByDefeatError::RequestFailed(_) => "request_failed",
        ByDefeatError::CatalogUnavailable(_) => "catalog_unavailable",
        ByDefeatError::Network(_) => "network",
        ByDefeatError::Decode(_) => "decode",
        ByDefeatError::Config(_) => "config",
        ByDefeatError::Playback(_) => "playback",
        ByDefeatError::Storage(_) => "storage",
        ByDefeatError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_labels_are_snake_case() {
        assert_eq!(error_label(&ByDefeatError::RequestFailed(502)), "request_failed");
        assert_eq!(error_label(&ByDefeatError::InsufficientPermissions), "insufficient_permissions");
        assert_eq!(error_label(&ByDefeatError::Storage("disk".into())), "storage");
    }
}
