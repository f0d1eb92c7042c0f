//! MCP message types for the operations this service speaks: `initialize`,
//! `tools/list`, `tools/call`, `prompts/list`, `prompts/get`.
//!
//! Trimmed from the full 2025-06-18 schema to what those five methods need.
//! Resources, sampling, elicitation, completion, roots and notifications are
//! not part of this service's contract and have no types here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// JSON-RPC request identifier: a string or a number, never both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    /// A numeric request id.
    Number(i64),
    /// A string request id.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// Protocol version string, e.g. `"2025-06-18"`.
pub type ProtocolVersion = String;

// ============================================================================
// Initialize
// ============================================================================

/// Identifies a client or server implementation during the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    /// Implementation name, e.g. `"gpumcp"`.
    pub name: String,
    /// Implementation version string.
    pub version: String,
}

/// `initialize` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Protocol version the client wants to speak.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,
    /// Capabilities the client supports.
    pub capabilities: ClientCapabilities,
    /// Client implementation info.
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

/// `initialize` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Protocol version the server will speak for this session.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,
    /// Capabilities this server advertises.
    pub capabilities: ServerCapabilities,
    /// Server implementation info.
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
}

/// Capabilities a client may declare. This service does not branch on any of
/// them; the field exists so the handshake round-trips faithfully.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Opaque experimental capability bag, passed through unexamined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, serde_json::Value>>,
}

/// `{ listChanged: bool }`, the only sub-capability this server has an
/// opinion on: list-changed notifications are never emitted, so
/// every handshake advertises `listChanged: false`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListChangedCapability {
    /// Whether `notifications/*/list_changed` is supported. Always `false`.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Capabilities this server advertises: tools and prompts, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool-calling support.
    pub tools: ListChangedCapability,
    /// Prompt-template support.
    pub prompts: ListChangedCapability,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: ListChangedCapability::default(),
            prompts: ListChangedCapability::default(),
        }
    }
}

// ============================================================================
// Content
// ============================================================================

/// A block of content carried in a tool result or prompt message.
///
/// Tool outputs are always a single JSON payload rendered as a text blob,
/// so `Text` is the only variant this service produces or expects to
/// consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text content.
    Text(TextContent),
}

impl ContentBlock {
    /// Build a text content block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextContent { text: text.into() })
    }
}

/// Text content payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// The text itself.
    pub text: String,
}

/// The role a prompt message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Attributed to the end user / caller.
    User,
    /// Attributed to the assistant.
    Assistant,
}

// ============================================================================
// Tools
// ============================================================================

/// JSON Schema for a tool's input, always an `object` schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    /// Always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Per-property JSON Schema, keyed by property name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, serde_json::Value>>,
    /// Names of required properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// One tool's advertised metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Stable machine name, e.g. `"get_gpu_health"`.
    pub name: String,
    /// Human-readable description shown to callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input parameter schema.
    #[serde(rename = "inputSchema")]
    pub input_schema: ToolInputSchema,
}

/// `tools/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// The tools this server (or, on the gateway, the union across agents) exposes.
    pub tools: Vec<Tool>,
}

/// `tools/call` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Name of the tool to invoke.
    pub name: String,
    /// Tool arguments, decoded per-tool by the handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

/// `tools/call` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Result content blocks.
    pub content: Vec<ContentBlock>,
    /// Whether this result represents a tool-level error.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Build a successful result from a single JSON payload, rendered as text.
    #[must_use]
    pub fn success(payload: &serde_json::Value) -> Self {
        Self {
            content: vec![ContentBlock::text(payload.to_string())],
            is_error: None,
        }
    }

    /// Build a tool-level error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message.into())],
            is_error: Some(true),
        }
    }
}

// ============================================================================
// Prompts
// ============================================================================

/// One argument a prompt template accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name, referenced in the template as `{{name}}`.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the caller must supply this argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// One prompt's advertised metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// Stable machine name, e.g. `"triage_gpu_node"`.
    pub name: String,
    /// Human-readable description shown to callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments this prompt accepts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

/// `prompts/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPromptsResult {
    /// The prompts this server exposes.
    pub prompts: Vec<Prompt>,
}

/// `prompts/get` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptRequest {
    /// Name of the prompt to render.
    pub name: String,
    /// Caller-supplied argument values, substituted by the rendering law
    /// (caller values first, then argument defaults, unknown placeholders
    /// pass through untouched).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<HashMap<String, String>>,
}

/// One rendered message in a `prompts/get` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Who this message is attributed to.
    pub role: Role,
    /// The rendered content.
    pub content: ContentBlock,
}

/// `prompts/get` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptResult {
    /// Description of the rendered prompt (usually echoes the template's own description).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The rendered message(s).
    pub messages: Vec<PromptMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_capabilities_default_is_list_changed_false() {
        let caps = ServerCapabilities::default();
        let value = serde_json::to_value(&caps).unwrap();
        assert_eq!(value["tools"]["listChanged"], false);
        assert_eq!(value["prompts"]["listChanged"], false);
    }

    #[test]
    fn content_block_text_serializes_tagged() {
        let block = ContentBlock::text("hello");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"], "hello");
    }

    #[test]
    fn call_tool_result_error_sets_is_error() {
        let result = CallToolResult::error("boom");
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn request_id_untagged_round_trips_both_variants() {
        let num: RequestId = serde_json::from_value(serde_json::json!(1)).unwrap();
        assert_eq!(num, RequestId::Number(1));
        let s: RequestId = serde_json::from_value(serde_json::json!("abc")).unwrap();
        assert_eq!(s, RequestId::String("abc".into()));
    }
}
