//! The tool dispatch surface.
//!
//! Every tool — local NVML-backed or gateway proxy-wrapped — satisfies one
//! capability set: describe itself, then handle `(context, arguments)`.
//! The registry (`registry.rs`) treats both uniformly; the proxy in
//! `gpumcp-gateway` implements this same trait so it slots into the exact
//! same dispatch path as a local tool.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use gpumcp_core::RequestContext;
use gpumcp_protocol::types::{Tool, ToolInputSchema};
use serde_json::Value;

/// Outcome status of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Nothing unusual.
    Success,
    /// Completed, but something is worth the caller's attention.
    Warning,
    /// The tool could not complete its request.
    Error,
    /// Completed with reduced functionality (e.g. partial device coverage).
    Degraded,
    /// Completed and found something that needs immediate operator attention.
    Critical,
}

impl ToolStatus {
    /// The wire string for this status, used as the `status` field of a tool body.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of one tool invocation: a status plus a tool-specific JSON body.
///
/// `to_call_tool_result` renders this as the wire format requires: a
/// structured content array whose first element is a text blob carrying the
/// JSON payload. A `Critical`/`Error` status is still a *successful* MCP
/// call (`is_error` stays unset) unless the tool truly could not run at
/// all — see [`ToolOutcome::failure`].
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Machine status of the call.
    pub status: ToolStatus,
    /// Tool-specific JSON body. Always includes a top-level `status` field
    /// mirroring [`ToolOutcome::status`] so callers parsing the text blob
    /// don't need out-of-band access to it.
    pub body: Value,
    /// Set when the tool failed to execute at all (malformed arguments,
    /// unrecoverable I/O). Rendered as an MCP tool-error result rather
    /// than a JSON-RPC error.
    pub hard_error: Option<String>,
}

impl ToolOutcome {
    /// Build a successful (or warning/degraded/critical) outcome from a body value.
    #[must_use]
    pub fn ok(status: ToolStatus, mut body: Value) -> Self {
        if let Value::Object(ref mut map) = body {
            map.insert("status".to_string(), Value::String(status.as_str().to_string()));
        }
        Self { status, body, hard_error: None }
    }

    /// Build a hard-failure outcome: the tool could not run at all.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: ToolStatus::Error,
            body: serde_json::json!({ "status": "error", "error": message }),
            hard_error: Some(message),
        }
    }

    /// Render as the MCP `tools/call` result.
    #[must_use]
    pub fn into_call_tool_result(self) -> gpumcp_protocol::types::CallToolResult {
        if let Some(message) = self.hard_error {
            gpumcp_protocol::types::CallToolResult::error(message)
        } else {
            gpumcp_protocol::types::CallToolResult::success(&self.body)
        }
    }
}

/// Error raised while decoding a tool's argument map: fail fast with a structured, field-level message
/// rather than propagating a generic deserialization error.
#[derive(Debug, thiserror::Error)]
#[error("invalid arguments: {0}")]
pub struct ArgumentError(pub String);

/// Typed argument map handed to a tool. Wraps the raw JSON object and
/// provides per-tool decoders a place to fail fast on type mismatch.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments(pub HashMap<String, Value>);

impl ToolArguments {
    /// Build from the raw JSON-RPC arguments value (object or absent).
    #[must_use]
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self(map.into_iter().collect()),
            _ => Self(HashMap::new()),
        }
    }

    /// Optional string field.
    pub fn str_opt(&self, key: &str) -> Result<Option<String>, ArgumentError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ArgumentError(format!("field '{key}' must be a string, got {other}"))),
        }
    }

    /// Optional boolean field with a default.
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ArgumentError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(ArgumentError(format!("field '{key}' must be a boolean, got {other}"))),
        }
    }

    /// Optional unsigned integer field.
    pub fn u64_opt(&self, key: &str) -> Result<Option<u64>, ArgumentError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| ArgumentError(format!("field '{key}' must be a non-negative integer")))
                .map(Some),
            Some(other) => Err(ArgumentError(format!("field '{key}' must be an integer, got {other}"))),
        }
    }
}

/// Static metadata advertised in `tools/list`.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Stable machine name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON-schema-shaped input definition.
    pub input_schema: ToolInputSchema,
}

impl ToolDescriptor {
    /// Render as the wire `Tool` type for `tools/list`.
    #[must_use]
    pub fn to_wire(&self) -> Tool {
        Tool {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// Capability set every tool — local or gateway-proxied — satisfies, giving
/// polymorphism over tools regardless of where they actually run.
#[async_trait]
pub trait ToolHandler: Send + Sync + fmt::Debug {
    /// Static metadata for `tools/list`.
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool. Implementations must honour `ctx` cancellation at
    /// every suspension point and never hold a lock across one.
    async fn handle(&self, ctx: &RequestContext, args: ToolArguments) -> ToolOutcome;
}

/// Build a schema with a flat set of optional/required string-ish properties.
///
/// A small helper shared by the concrete tool modules; not meant to replace
/// `schemars` for anything richer than "a handful of scalar properties",
/// which is all these tools need.
#[must_use]
pub fn object_schema(properties: &[(&str, &str)], required: &[&str]) -> ToolInputSchema {
    let mut props = std::collections::HashMap::new();
    for (name, description) in properties {
        props.insert(
            (*name).to_string(),
            serde_json::json!({ "type": "string", "description": description }),
        );
    }
    ToolInputSchema {
        schema_type: "object".to_string(),
        properties: if props.is_empty() { None } else { Some(props) },
        required: if required.is_empty() {
            None
        } else {
            Some(required.iter().map(|s| (*s).to_string()).collect())
        },
    }
}
