//! JSON-RPC 2.0 envelope used by both MCP transports.
//!
//! Batching is not part of this service's contract (stdio sends one
//! message per line, HTTP streaming carries one request per POST), so
//! this module only implements the single-message envelope — request,
//! response, notification, and the standard error codes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::types::RequestId;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// Zero-sized type that serializes/deserializes as the literal `"2.0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// JSON-RPC request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version tag.
    pub jsonrpc: JsonRpcVersion,
    /// Request method name (e.g. `"tools/call"`).
    pub method: String,
    /// Request parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request identifier.
    pub id: RequestId,
}

/// JSON-RPC response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version tag.
    pub jsonrpc: JsonRpcVersion,
    /// Response result (success case).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Response error (error case).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier (absent for parse errors).
    pub id: Option<RequestId>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC error codes, plus the MCP application range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    /// Parse error (-32700): malformed JSON on the wire.
    ParseError,
    /// Invalid request (-32600).
    InvalidRequest,
    /// Method not found (-32601).
    MethodNotFound,
    /// Invalid params (-32602).
    InvalidParams,
    /// Internal error (-32603).
    InternalError,
    /// Application-defined error.
    ApplicationError(i32),
}

impl JsonRpcErrorCode {
    /// The numeric error code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ApplicationError(code) => code,
        }
    }

    /// The standard error message for this code.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ApplicationError(_) => "Application error",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl From<JsonRpcErrorCode> for JsonRpcError {
    fn from(code: JsonRpcErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data: None,
        }
    }
}

impl JsonRpcRequest {
    /// Build a request with parameters.
    pub fn with_params<P: Serialize>(
        method: impl Into<String>,
        params: P,
        id: RequestId,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params: Some(serde_json::to_value(params)?),
            id,
        })
    }

    /// Build a request with no parameters.
    #[must_use]
    pub fn without_params(method: impl Into<String>, id: RequestId) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params: None,
            id,
        }
    }
}

impl JsonRpcResponse {
    /// Build a successful response.
    #[must_use]
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn error(error: JsonRpcError, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Build a parse-error response (id is absent per the JSON-RPC spec).
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(
            JsonRpcError {
                code: JsonRpcErrorCode::ParseError.code(),
                message: message.into(),
                data: None,
            },
            None,
        )
    }

    /// True if this response carries a result rather than an error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn version_round_trips() {
        let json = serde_json::to_string(&JsonRpcVersion).unwrap();
        assert_eq!(json, "\"2.0\"");
        let parsed: JsonRpcVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, JsonRpcVersion);
    }

    #[test]
    fn version_rejects_mismatch() {
        let err = serde_json::from_str::<JsonRpcVersion>("\"1.0\"");
        assert!(err.is_err());
    }

    #[test]
    fn request_with_params_serializes_method_and_params() {
        let req = JsonRpcRequest::with_params(
            "tools/call",
            json!({"name": "get_gpu_health"}),
            RequestId::String("1".into()),
        )
        .unwrap();
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["method"], "tools/call");
        assert_eq!(value["params"]["name"], "get_gpu_health");
    }

    #[test]
    fn error_response_omits_result() {
        let resp = JsonRpcResponse::error(
            JsonRpcErrorCode::MethodNotFound.into(),
            Some(RequestId::String("1".into())),
        );
        assert!(!resp.is_success());
        assert!(resp.result.is_none());
    }

    #[test]
    fn parse_error_has_null_id() {
        let resp = JsonRpcResponse::parse_error("unexpected EOF");
        assert!(resp.id.is_none());
        assert_eq!(resp.error.unwrap().code, -32700);
    }
}
