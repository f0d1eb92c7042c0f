//! # gpumcp-protocol
//!
//! MCP message types and the JSON-RPC 2.0 envelope, scoped to the five
//! methods this service speaks: `initialize`, `tools/list`, `tools/call`,
//! `prompts/list`, `prompts/get`. No resources, sampling,
//! elicitation, roots, or notification types — they aren't part of this
//! service's contract.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod jsonrpc;
pub mod types;

pub use jsonrpc::{JsonRpcError, JsonRpcErrorCode, JsonRpcRequest, JsonRpcResponse, JsonRpcVersion};
pub use types::{
    CallToolRequest, CallToolResult, ClientCapabilities, ContentBlock, GetPromptRequest,
    GetPromptResult, Implementation, InitializeRequest, InitializeResult, ListChangedCapability,
    ListPromptsResult, ListToolsResult, Prompt, PromptArgument, PromptMessage, RequestId, Role,
    ServerCapabilities, TextContent, Tool, ToolInputSchema,
};

/// Current MCP protocol version this service speaks.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Method names this service dispatches on.
pub mod methods {
    /// Initialize handshake method.
    pub const INITIALIZE: &str = "initialize";
    /// List available tools method.
    pub const LIST_TOOLS: &str = "tools/list";
    /// Call a specific tool method.
    pub const CALL_TOOL: &str = "tools/call";
    /// List available prompts method.
    pub const LIST_PROMPTS: &str = "prompts/list";
    /// Get a specific prompt method.
    pub const GET_PROMPT: &str = "prompts/get";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_version_matches_handshake_expectation() {
        assert_eq!(PROTOCOL_VERSION, "2025-06-18");
    }

    #[test]
    fn method_names_match_spec_wire_strings() {
        assert_eq!(methods::INITIALIZE, "initialize");
        assert_eq!(methods::LIST_TOOLS, "tools/list");
        assert_eq!(methods::CALL_TOOL, "tools/call");
        assert_eq!(methods::LIST_PROMPTS, "prompts/list");
        assert_eq!(methods::GET_PROMPT, "prompts/get");
    }
}
