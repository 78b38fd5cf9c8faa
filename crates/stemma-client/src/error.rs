//! Error types for the Stemma API client.

use thiserror::Error;

/// Errors that can occur when talking to the remote web API.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClientError {
    /// Credential or token failure, surfaced after the single 401 retry.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection, timeout, or DNS failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server returned an invalid or unparseable response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Server returned an unexpected status code.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from server, if any.
        message: String,
    },

    /// A background task ended in FAILURE or REVOKED.
    #[error("Background task ended in {state}: {detail}")]
    ServerTask {
        /// Terminal task state as reported by the server.
        state: String,
        /// Server-provided error detail.
        detail: String,
    },

    /// The file already exists remotely (409). Callers treat this as a
    /// soft skip, never a fatal error.
    #[error("File already exists remotely: {0}")]
    Conflict(String),

    /// File system I/O failed during a transfer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
