//! # gpumcp-server
//!
//! The MCP session core: JSON-RPC method dispatch over the
//! tool and prompt registries defined in `gpumcp-tools`, served over
//! either transport from `gpumcp-transport`. Also owns process metrics
//! and graceful shutdown.
//!
//! Deliberately narrow: no resources, no sampling, no auth middleware, no
//! rate limiting, no generic HTTP routing — exactly the five methods and
//! two transports this service's contract needs.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use lifecycle::ServerLifecycle;
pub use metrics::Metrics;
pub use server::{McpServer, Transport};
pub use session::{McpSession, ServerIdentity};
