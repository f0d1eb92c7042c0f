//! Exercises the wire types the way a transport actually uses them: decode
//! an inbound request, build a response, and check the exact JSON shape a
//! client on the other side of the wire would see.

use gpumcp_protocol::types::{
    CallToolRequest, CallToolResult, ContentBlock, GetPromptRequest, Implementation,
    InitializeRequest, InitializeResult, Prompt, PromptArgument, Role, ServerCapabilities,
};
use gpumcp_protocol::{
    methods, JsonRpcError, JsonRpcErrorCode, JsonRpcRequest, JsonRpcResponse, RequestId,
};

#[test]
fn initialize_handshake_round_trips_through_the_wire_format() {
    let request_json = serde_json::json!({
        "jsonrpc": "2.0",
        "method": methods::INITIALIZE,
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "0.0.1"},
        },
        "id": 1,
    });

    let request: JsonRpcRequest = serde_json::from_value(request_json).expect("decodes");
    assert_eq!(request.method, methods::INITIALIZE);

    let params: InitializeRequest = serde_json::from_value(request.params.unwrap()).expect("decodes params");
    assert_eq!(params.client_info.name, "test-client");

    let result = InitializeResult {
        protocol_version: gpumcp_protocol::PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities::default(),
        server_info: Implementation { name: "gpumcp-agent".to_string(), version: "0.1.0".to_string() },
    };
    let response = JsonRpcResponse::success(serde_json::to_value(&result).unwrap(), request.id);

    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(wire["result"]["protocolVersion"], gpumcp_protocol::PROTOCOL_VERSION);
    assert_eq!(wire["result"]["capabilities"]["tools"]["listChanged"], false);
    assert_eq!(wire["id"], 1);
}

#[test]
fn call_tool_request_with_no_arguments_omits_the_field_on_the_wire() {
    let call = CallToolRequest { name: "get_gpu_health".to_string(), arguments: None };
    let wire = serde_json::to_value(&call).unwrap();
    assert_eq!(wire["name"], "get_gpu_health");
    assert!(wire.get("arguments").is_none(), "absent arguments must not serialize as null");
}

#[test]
fn call_tool_result_success_carries_a_single_text_block() {
    let payload = serde_json::json!({"status": "success", "devices": []});
    let result = CallToolResult::success(&payload);
    assert_eq!(result.content.len(), 1);
    let ContentBlock::Text(text) = &result.content[0];
    let decoded: serde_json::Value = serde_json::from_str(&text.text).unwrap();
    assert_eq!(decoded["status"], "success");
    assert!(result.is_error.is_none());
}

#[test]
fn call_tool_result_error_sets_is_error_true() {
    let result = CallToolResult::error("device query failed");
    assert_eq!(result.is_error, Some(true));
    let ContentBlock::Text(text) = &result.content[0];
    assert_eq!(text.text, "device query failed");
}

#[test]
fn get_prompt_request_decodes_caller_supplied_arguments() {
    let wire = serde_json::json!({
        "name": "gpu-triage",
        "arguments": {"node": "node-a"},
    });
    let request: GetPromptRequest = serde_json::from_value(wire).unwrap();
    assert_eq!(request.name, "gpu-triage");
    assert_eq!(request.arguments.unwrap().get("node"), Some(&"node-a".to_string()));
}

#[test]
fn prompt_message_role_serializes_lowercase() {
    let wire = serde_json::to_value(Role::User).unwrap();
    assert_eq!(wire, "user");
    let wire = serde_json::to_value(Role::Assistant).unwrap();
    assert_eq!(wire, "assistant");
}

#[test]
fn prompt_with_required_argument_round_trips() {
    let prompt = Prompt {
        name: "gpu-health-check".to_string(),
        description: Some("Run a standard GPU health sweep".to_string()),
        arguments: Some(vec![PromptArgument {
            name: "node".to_string(),
            description: Some("Node to scope to".to_string()),
            required: Some(false),
        }]),
    };
    let wire = serde_json::to_value(&prompt).unwrap();
    let decoded: Prompt = serde_json::from_value(wire).unwrap();
    assert_eq!(decoded.name, "gpu-health-check");
    assert_eq!(decoded.arguments.unwrap()[0].name, "node");
}

#[test]
fn error_response_has_no_result_field_and_a_standard_code() {
    let error: JsonRpcError = JsonRpcErrorCode::MethodNotFound.into();
    let response = JsonRpcResponse::error(error, Some(RequestId::Number(42)));
    let wire = serde_json::to_value(&response).unwrap();
    assert!(wire.get("result").is_none());
    assert_eq!(wire["error"]["code"], -32601);
    assert_eq!(wire["id"], 42);
}

#[test]
fn parse_error_response_omits_the_id_entirely() {
    let response = JsonRpcResponse::parse_error("unexpected token");
    let wire = serde_json::to_value(&response).unwrap();
    assert!(wire.get("id").is_none() || wire["id"].is_null());
}

#[test]
fn request_id_accepts_either_a_string_or_a_number() {
    let numeric: RequestId = serde_json::from_value(serde_json::json!(5)).unwrap();
    let stringy: RequestId = serde_json::from_value(serde_json::json!("abc-123")).unwrap();
    assert_eq!(numeric, RequestId::Number(5));
    assert_eq!(stringy, RequestId::String("abc-123".to_string()));
}
