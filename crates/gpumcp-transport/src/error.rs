//! Transport-level error type.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by the stdio and HTTP transports.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// A line on stdin (or an HTTP body) was not valid JSON-RPC.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// stdin closed or the underlying stream returned an I/O error.
    #[error("io error: {0}")]
    Io(String),

    /// Response serialization failed (should not happen for well-formed responses).
    #[error("serialization failed: {0}")]
    Serialization(String),
}
