//! Shared error type for the core crate.

/// Result type alias used throughout `gpumcp-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can originate from the core context/correlation layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// A required piece of context metadata was missing or malformed.
    #[error("invalid context: {0}")]
    InvalidContext(String),
}
