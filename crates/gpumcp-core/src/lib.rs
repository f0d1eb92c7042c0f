//! # gpumcp-core
//!
//! Foundation types shared by every other `gpumcp-*` crate: the per-request
//! context (cancellation + metadata + correlation id), the correlation-id
//! generator itself, and a common error type.
//!
//! Scoped to what a GPU diagnostic agent/gateway pair actually needs: no
//! session persistence, no SIMD JSON, no message framing (that lives in
//! `gpumcp-transport`).

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod correlation;
pub mod duration;
pub mod error;
pub mod mode;

pub use context::RequestContext;
pub use correlation::CorrelationId;
pub use duration::{parse_go_duration, parse_or_default, DurationParseError};
pub use error::{Error, Result};
pub use mode::{OperationMode, ParseOperationModeError};

/// MCP protocol version this service speaks.
pub const PROTOCOL_VERSION: &str = "2025-06-18";
