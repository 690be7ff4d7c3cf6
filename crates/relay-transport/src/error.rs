//! Error types for the relay HTTP transport.

use thiserror::Error;

/// Errors that can occur while talking to the remote API.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a status other than 200
    #[error("unexpected HTTP status {status} ({body_summary})")]
    Status { status: u16, body_summary: String },

    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A document was requested but the body was empty
    #[error("remote returned an empty document for {url}")]
    EmptyDocument { url: String },

    /// The request could not be built from the given URL or payload
    #[error("invalid request: {0}")]
    InvalidPayload(String),
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;
