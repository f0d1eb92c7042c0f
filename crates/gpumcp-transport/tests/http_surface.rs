//! Drives the HTTP router as an external caller would: only the public
//! `gpumcp_transport::http` surface and the `RequestHandler` trait, no
//! access to the module's own internals.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gpumcp_core::RequestContext;
use gpumcp_protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};
use gpumcp_transport::handler::RequestHandler;
use gpumcp_transport::http::router;
use tower::ServiceExt;

struct EchoHandler;

#[async_trait]
impl RequestHandler for EchoHandler {
    async fn handle(&self, request: JsonRpcRequest, _ctx: RequestContext) -> JsonRpcResponse {
        JsonRpcResponse::success(serde_json::json!({ "echo": request.method }), request.id)
    }
}

struct FailingHandler;

#[async_trait]
impl RequestHandler for FailingHandler {
    async fn handle(&self, _request: JsonRpcRequest, _ctx: RequestContext) -> JsonRpcResponse {
        panic!("this handler should never be reached by a malformed request");
    }
}

fn test_router(handler: Arc<dyn RequestHandler>) -> axum::Router {
    router(handler, Arc::new(|| "# HELP test\n".to_string()), "gpumcp-test")
}

#[tokio::test]
async fn readyz_and_version_report_expected_shape() {
    let app = test_router(Arc::new(EchoHandler));

    let response = app
        .clone()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["server"], "gpumcp-test");
    assert_eq!(value["protocolVersion"], gpumcp_protocol::PROTOCOL_VERSION);
}

#[tokio::test]
async fn metrics_endpoint_serves_the_injected_renderer_verbatim() {
    let app = test_router(Arc::new(EchoHandler));

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.as_ref(), b"# HELP test\n");
}

#[tokio::test]
async fn mcp_endpoint_round_trips_a_request_through_the_handler() {
    let app = test_router(Arc::new(EchoHandler));
    let request = JsonRpcRequest::without_params("tools/list", RequestId::Number(7));
    let body = serde_json::to_string(&request).unwrap();

    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["result"]["echo"], "tools/list");
}

#[tokio::test]
async fn mcp_endpoint_rejects_malformed_json_before_reaching_the_handler() {
    let app = test_router(Arc::new(FailingHandler));

    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn session_id_is_minted_when_the_caller_sends_none() {
    let app = test_router(Arc::new(EchoHandler));
    let request = JsonRpcRequest::without_params("initialize", RequestId::Number(1));
    let body = serde_json::to_string(&request).unwrap();

    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let session_header = response.headers().get("mcp-session-id").expect("session id header present");
    assert!(!session_header.is_empty());
}
