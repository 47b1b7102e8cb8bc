//! Error types for the Beacon client.

use std::time::Duration;

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Transport-level failure (refused, HTTP error on upgrade, I/O)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The server did not start the session with a valid handshake
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Operation requires a connected session
    #[error("Not connected")]
    NotConnected,

    /// The connection dropped before the server acknowledged the call
    #[error("Connection lost")]
    ConnectionLost,

    /// The server acknowledged the call with an error
    #[error("Rejected by server: {0}")]
    Rejected(String),

    #[error("Session is already started")]
    AlreadyStarted,

    /// The session was stopped and cannot be restarted
    #[error("Session has been stopped")]
    Stopped,
}
