//! # gpumcp-transport
//!
//! The two wire transports this service speaks: stdio
//! line-delimited JSON-RPC, always available, and HTTP streaming on
//! `POST /mcp` with the `/healthz`, `/readyz`, `/version`, `/metrics`
//! auxiliary endpoints. Both transports are blind to MCP method dispatch —
//! they hand a parsed [`JsonRpcRequest`] to a [`RequestHandler`] and frame
//! whatever [`JsonRpcResponse`] comes back.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handler;
#[cfg(feature = "http")]
pub mod http;
pub mod stdio;

pub use error::{TransportError, TransportResult};
pub use gpumcp_protocol::{JsonRpcRequest, JsonRpcResponse};
pub use handler::RequestHandler;
