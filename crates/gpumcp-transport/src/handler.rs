//! The seam between a transport and the MCP method dispatcher.
//!
//! Both transports (stdio, HTTP) are blind to `initialize`/`tools/call`/etc.
//! dispatch logic; they only know how to frame one JSON-RPC request in and
//! one JSON-RPC response out. `gpumcp-server` implements this trait once and
//! hands an `Arc<dyn RequestHandler>` to whichever transport the CLI selects.

use async_trait::async_trait;
use gpumcp_core::RequestContext;
use gpumcp_protocol::{JsonRpcRequest, JsonRpcResponse};

/// Dispatches one framed JSON-RPC request to a response.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle a single request. Implementations never panic on malformed
    /// `method`/`params` — they return a JSON-RPC error response instead.
    async fn handle(&self, request: JsonRpcRequest, ctx: RequestContext) -> JsonRpcResponse;
}
