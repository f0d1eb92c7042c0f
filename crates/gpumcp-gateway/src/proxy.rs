//! Proxy tool handler: wraps one agent-role tool name so the gateway's own
//! `McpSession` can call it through the exact same [`ToolHandler`] dispatch
//! path as a local tool, fanning the call out to every node underneath.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use gpumcp_core::RequestContext;
use gpumcp_protocol::types::{CallToolRequest, RequestId};
use gpumcp_protocol::JsonRpcRequest;
use gpumcp_tools::{ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};

use crate::router::GatewayRouter;

/// Aggregates one tool call across every known node.
///
/// Default aggregation: `{status, node_count, nodes: [...]}`
/// where each entry under `nodes` carries the originating node name and
/// either the decoded tool body or an error string. `status` is `success`
/// only when every node succeeded; otherwise `degraded` (some succeeded) or
/// `error` (none did).
#[derive(Debug)]
pub struct ProxyToolHandler {
    descriptor: ToolDescriptor,
    router: Arc<GatewayRouter>,
}

impl ProxyToolHandler {
    /// Build a proxy for one agent tool name, advertising `descriptor` as
    /// its own (mirrored from the agent's `tools/list`).
    #[must_use]
    pub fn new(descriptor: ToolDescriptor, router: Arc<GatewayRouter>) -> Self {
        Self { descriptor, router }
    }
}

#[async_trait]
impl ToolHandler for ProxyToolHandler {
    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    async fn handle(&self, ctx: &RequestContext, args: ToolArguments) -> ToolOutcome {
        let arguments: serde_json::Map<String, Value> = args.0.into_iter().collect();
        let call = CallToolRequest {
            name: self.descriptor.name.clone(),
            arguments: if arguments.is_empty() { None } else { Some(Value::Object(arguments)) },
        };
        let request = match JsonRpcRequest::with_params(
            gpumcp_protocol::methods::CALL_TOOL,
            &call,
            RequestId::String(ctx.correlation_id.to_string()),
        ) {
            Ok(r) => r,
            Err(e) => return ToolOutcome::failure(format!("could not encode proxied call: {e}")),
        };

        let results = self.router.dispatch_all(ctx, &request).await;
        if results.is_empty() {
            return ToolOutcome::failure("no GPU nodes discovered to dispatch to");
        }

        let mut nodes = Vec::with_capacity(results.len());
        let mut success_count = 0usize;
        for result in &results {
            let entry = match decode_node_payload(&result.outcome) {
                Ok(data) => {
                    success_count += 1;
                    serde_json::json!({ "node_name": result.node, "pod_name": result.pod_name, "data": data })
                }
                Err(error) => {
                    serde_json::json!({ "node_name": result.node, "pod_name": result.pod_name, "error": error })
                }
            };
            nodes.push(entry);
        }

        // Partial success (at least one usable payload) is still reported
        // as the aggregate succeeding; only all-node failure is a hard
        // error.
        if success_count == 0 {
            return ToolOutcome::failure(format!("all {} node(s) failed to respond", results.len()));
        }

        ToolOutcome::ok(
            ToolStatus::Success,
            serde_json::json!({
                "node_count": results.len(),
                "nodes": nodes,
            }),
        )
    }
}

/// Decode one node's dispatch outcome into either its tool payload or an
/// error string, for the default aggregation shape.
pub(crate) fn decode_node_payload(outcome: &crate::error::GatewayResult<gpumcp_protocol::JsonRpcResponse>) -> Result<Value, String> {
    let response = match outcome {
        Ok(r) => r,
        Err(e) => return Err(e.to_string()),
    };

    if let Some(error) = &response.error {
        return Err(error.message.clone());
    }

    let Some(result) = &response.result else {
        return Err("agent returned neither a result nor an error".to_string());
    };

    let call_result: gpumcp_protocol::types::CallToolResult = match serde_json::from_value(result.clone()) {
        Ok(r) => r,
        Err(e) => return Err(format!("could not decode tool result: {e}")),
    };

    let gpumcp_protocol::types::ContentBlock::Text(text) = call_result
        .content
        .into_iter()
        .next()
        .ok_or_else(|| "tool result carried no content".to_string())?;

    if call_result.is_error == Some(true) {
        return Err(text.text);
    }

    Ok(serde_json::from_str(&text.text).unwrap_or(Value::String(text.text)))
}
