//! Error types for the sync engine.

use relay_config_and_utils::CoreError;
use relay_transport::TransportError;
use thiserror::Error;

/// Sync engine error type.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The login page carried no `__token__` field
    #[error("login form token not found on the remote login page")]
    AuthTokenMissing,

    /// The login call succeeded but did not yield both session identifiers
    #[error("login failed, check the user name and password: {0}")]
    AuthIncomplete(String),

    /// No session identifiers are available yet
    #[error("not authenticated, log in first")]
    NotAuthenticated,

    /// The server answered with a failure envelope
    #[error("remote error: {0}")]
    Remote(String),

    /// Command category other than `xml`
    #[error("unrecognized command: {0}")]
    UnrecognizedCommand(String),

    /// Receipt file name does not follow the naming grammar
    #[error("malformed receipt file name: {0}")]
    MalformedFilename(String),

    /// Command row or download data missing required fields
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// IO error (reading receipts, writing documents)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport error (network, status, decoding)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding, path or configuration error from the shared utilities
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Filesystem watcher error
    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Internal signal that the watcher loop was asked to stop
    #[error("watcher stopped")]
    WatcherStopped,
}

/// Result type for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;
