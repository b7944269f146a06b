use crate::error::{ReviewError, Result};
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `log_level` is used
/// (error, warn, info, debug, trace).
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(parse_log_level(log_level)))
        .map_err(|e| ReviewError::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| ReviewError::Config(format!("Failed to initialize logging: {}", e)))
}

/// Normalizes a log level name, defaulting to `info` for unknown values
pub fn parse_log_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}
