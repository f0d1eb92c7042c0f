//! The MCP session core: routes JSON-RPC method calls to the
//! tool and prompt registries, transport-agnostic.
//!
//! One [`McpSession`] is shared across every stdio session and every HTTP
//! connection — the registries are immutable after startup, so
//! no per-session mutable state is needed beyond what the transport layer
//! already tracks (the HTTP session-id header).

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use gpumcp_core::RequestContext;
use gpumcp_protocol::jsonrpc::{JsonRpcError, JsonRpcErrorCode, JsonRpcRequest, JsonRpcResponse};
use gpumcp_protocol::types::{
    CallToolRequest, GetPromptRequest, GetPromptResult, Implementation, InitializeRequest, InitializeResult,
    ListChangedCapability, PromptMessage, Role, ServerCapabilities,
};
use gpumcp_protocol::{methods, PROTOCOL_VERSION};
use gpumcp_tools::{PromptRegistry, ToolArguments, ToolRegistry};
use gpumcp_transport::RequestHandler;
use tracing::{debug, warn};

use crate::metrics::Metrics;

/// Identifies this server in the `initialize` handshake.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    /// Server name, e.g. `"gpumcp-agent"` or `"gpumcp-gateway"`.
    pub name: String,
    /// Build version string.
    pub version: String,
}

/// Dispatches `initialize`, `tools/list`, `tools/call`, `prompts/list`,
/// `prompts/get` against a fixed tool and prompt registry.
#[derive(Debug, Clone)]
pub struct McpSession {
    identity: ServerIdentity,
    tools: Arc<ToolRegistry>,
    prompts: Arc<PromptRegistry>,
    metrics: Metrics,
}

impl McpSession {
    /// Build a session core over a fixed tool and prompt registry.
    #[must_use]
    pub fn new(identity: ServerIdentity, tools: Arc<ToolRegistry>, prompts: Arc<PromptRegistry>, metrics: Metrics) -> Self {
        Self { identity, tools, prompts, metrics }
    }

    /// This session's server identity, for the `GET /version` endpoint.
    #[must_use]
    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    fn handle_initialize(&self) -> serde_json::Value {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ListChangedCapability::default(),
                prompts: ListChangedCapability::default(),
            },
            server_info: Implementation { name: self.identity.name.clone(), version: self.identity.version.clone() },
        };
        serde_json::to_value(result).expect("InitializeResult always serializes")
    }

    fn handle_list_tools(&self) -> serde_json::Value {
        serde_json::to_value(self.tools.list()).expect("ListToolsResult always serializes")
    }

    fn handle_list_prompts(&self) -> serde_json::Value {
        serde_json::to_value(self.prompts.list()).expect("ListPromptsResult always serializes")
    }

    async fn handle_call_tool(&self, ctx: &RequestContext, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let request: CallToolRequest = params
            .ok_or_else(|| invalid_params("tools/call requires params"))
            .and_then(|v| serde_json::from_value(v).map_err(|e| invalid_params(e.to_string())))?;

        let Some(handler) = self.tools.get(&request.name) else {
            return Ok(serde_json::to_value(
                gpumcp_protocol::types::CallToolResult::error(format!("unknown tool: {}", request.name)),
            )
            .expect("CallToolResult always serializes"));
        };

        let args = ToolArguments::from_value(request.arguments);
        let start = Instant::now();
        let outcome = handler.handle(ctx, args).await;
        let status = outcome.status.as_str().to_string();
        self.metrics.record_tool_call(&request.name, &status, start.elapsed());

        Ok(serde_json::to_value(outcome.into_call_tool_result()).expect("CallToolResult always serializes"))
    }

    fn handle_get_prompt(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let request: GetPromptRequest = params
            .ok_or_else(|| invalid_params("prompts/get requires params"))
            .and_then(|v| serde_json::from_value(v).map_err(|e| invalid_params(e.to_string())))?;

        let Some(prompt) = self.prompts.get(&request.name) else {
            return Err(JsonRpcError {
                code: JsonRpcErrorCode::ApplicationError(-32001).code(),
                message: format!("unknown prompt: {}", request.name),
                data: None,
            });
        };

        let caller_args = request.arguments.unwrap_or_default();
        if let Err(e) = prompt.validate(&caller_args) {
            return Err(JsonRpcError {
                code: JsonRpcErrorCode::InvalidParams.code(),
                message: e.to_string(),
                data: None,
            });
        }

        let rendered = prompt.render(&caller_args);
        let result = GetPromptResult {
            description: Some(prompt.description.to_string()),
            messages: vec![PromptMessage {
                role: Role::User,
                content: gpumcp_protocol::types::ContentBlock::text(rendered),
            }],
        };
        Ok(serde_json::to_value(result).expect("GetPromptResult always serializes"))
    }
}

fn invalid_params(message: impl Into<String>) -> JsonRpcError {
    JsonRpcError { code: JsonRpcErrorCode::InvalidParams.code(), message: message.into(), data: None }
}

#[async_trait]
impl RequestHandler for McpSession {
    async fn handle(&self, request: JsonRpcRequest, ctx: RequestContext) -> JsonRpcResponse {
        debug!(method = %request.method, correlation_id = %ctx.correlation_id, "dispatching MCP request");
        self.metrics.adjust_active_requests(1.0);

        let result = match request.method.as_str() {
            methods::INITIALIZE => {
                let _: Option<InitializeRequest> = request
                    .params
                    .clone()
                    .and_then(|v| serde_json::from_value(v).ok());
                Ok(self.handle_initialize())
            }
            methods::LIST_TOOLS => Ok(self.handle_list_tools()),
            methods::CALL_TOOL => self.handle_call_tool(&ctx, request.params.clone()).await,
            methods::LIST_PROMPTS => Ok(self.handle_list_prompts()),
            methods::GET_PROMPT => self.handle_get_prompt(request.params.clone()),
            other => {
                warn!(method = other, "method not found");
                Err(JsonRpcError {
                    code: JsonRpcErrorCode::MethodNotFound.code(),
                    message: format!("method not found: {other}"),
                    data: None,
                })
            }
        };

        self.metrics.adjust_active_requests(-1.0);

        match result {
            Ok(value) => JsonRpcResponse::success(value, request.id),
            Err(error) => JsonRpcResponse::error(error, Some(request.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpumcp_protocol::types::RequestId;
    use gpumcp_tools::tools::register_agent_tools;
    use gpumcp_tools::{nvml::MockBackend, prompts::library, AgentContext};
    use std::sync::Arc;

    fn session() -> McpSession {
        let tools = register_agent_tools(AgentContext::new(Arc::new(MockBackend::default()), "n", "p"));
        McpSession::new(
            ServerIdentity { name: "gpumcp-agent".to_string(), version: "0.1.0".to_string() },
            Arc::new(tools),
            Arc::new(library()),
            Metrics::install().expect("metrics install"),
        )
    }

    #[tokio::test]
    async fn initialize_advertises_tools_and_prompts() {
        let session = session();
        let request = JsonRpcRequest::without_params(methods::INITIALIZE, RequestId::Number(1));
        let response = session.handle(request, RequestContext::new()).await;
        let result = response.result.unwrap();
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["capabilities"]["prompts"]["listChanged"], false);
    }

    #[tokio::test]
    async fn tools_list_includes_all_agent_tools() {
        let session = session();
        let request = JsonRpcRequest::without_params(methods::LIST_TOOLS, RequestId::Number(1));
        let response = session.handle(request, RequestContext::new()).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 5);
    }

    #[tokio::test]
    async fn prompts_list_includes_contract_prompts() {
        let session = session();
        let request = JsonRpcRequest::without_params(methods::LIST_PROMPTS, RequestId::Number(1));
        let response = session.handle(request, RequestContext::new()).await;
        let names: Vec<String> = response.result.unwrap()["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        for expected in ["gpu-health-check", "diagnose-xid-errors", "gpu-triage"] {
            assert!(names.contains(&expected.to_string()));
        }
    }

    #[tokio::test]
    async fn call_tool_dispatches_and_wraps_result_as_text_content() {
        let session = session();
        let request = JsonRpcRequest::with_params(
            methods::CALL_TOOL,
            serde_json::json!({ "name": "get_gpu_inventory" }),
            RequestId::Number(1),
        )
            .unwrap();
        let response = session.handle(request, RequestContext::new()).await;
        let result = response.result.unwrap();
        assert!(result["content"][0]["text"].as_str().unwrap().contains("gpus"));
    }

    #[tokio::test]
    async fn call_unknown_tool_is_a_tool_error_not_a_jsonrpc_error() {
        let session = session();
        let request = JsonRpcRequest::with_params(
            methods::CALL_TOOL,
            serde_json::json!({ "name": "does_not_exist" }),
            RequestId::Number(1),
        )
            .unwrap();
        let response = session.handle(request, RequestContext::new()).await;
        assert!(response.is_success());
        assert_eq!(response.result.unwrap()["isError"], true);
    }

    #[tokio::test]
    async fn unknown_method_is_a_jsonrpc_error() {
        let session = session();
        let request = JsonRpcRequest::without_params("not/a/method", RequestId::Number(1));
        let response = session.handle(request, RequestContext::new()).await;
        assert!(!response.is_success());
        assert_eq!(response.error.unwrap().code, JsonRpcErrorCode::MethodNotFound.code());
    }
}
