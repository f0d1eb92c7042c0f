//! Server-level error type.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised assembling or running the MCP session core.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The transport layer failed to start or run.
    #[error("transport error: {0}")]
    Transport(#[from] gpumcp_transport::TransportError),

    /// The metrics recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// Startup configuration was invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}
