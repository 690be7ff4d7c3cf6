//! # Observability
//!
//! Logging setup for the customs relay agent.
//!
//! Crates in the workspace only *produce* logs through the standard `tracing`
//! macros. The binary calls [`init_with_config`] once at startup and decides
//! where the output goes:
//!
//! - a compact human-readable stream on stderr, and/or
//! - structured JSONL appended to a log file (one object per line).
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "customs-relay".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/var/log/customs-relay/relay.jsonl".into()),
//!     also_stderr: true,
//! });
//!
//! tracing::info!("relay started");
//! ```

mod file_sink;
mod json_layer;

use std::path::PathBuf;

pub use file_sink::AppendLogWriter;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "customs-relay").
    /// Included in every JSONL line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSONL log file. When `None` only stderr output is installed.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize logging with custom configuration.
///
/// If the log file cannot be opened the file layer is skipped and a warning
/// is emitted on the remaining stderr layer; logging never aborts startup.
/// Calling this twice is harmless: the second global subscriber is rejected.
pub fn init_with_config(config: LogConfig) {
    file_sink::init_subscriber(&config);
}
