//! Core error types shared by the relay crates.

use thiserror::Error;

/// Core error type for configuration and local file operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration error (invalid or missing values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Path error (e.g., home directory not found, path escapes its root)
    #[error("Path error: {0}")]
    Path(String),

    /// XML document could not be read
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
