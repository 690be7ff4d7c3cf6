//! Logging initialization for the relay agent.
//!
//! Thin wrapper over the observability crate: JSONL to the agent's log file
//! plus a compact stderr stream.

use crate::Paths;

/// Service name written into every structured log line.
const SERVICE_NAME: &str = "customs-relay";

/// Initialize logging for the relay agent.
///
/// `level` is the default filter; `RUST_LOG` overrides it. When `paths` is
/// given, structured logs are also appended to `paths.log_file()`.
///
/// ```ignore
/// init_logging("info", Some(&paths));
/// tracing::info!("relay started");
/// ```
pub fn init_logging(level: &str, paths: Option<&Paths>) {
    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: paths.map(Paths::log_file),
        also_stderr: true,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
