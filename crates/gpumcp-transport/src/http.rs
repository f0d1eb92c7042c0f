//! HTTP streaming transport: `POST /mcp` plus the auxiliary liveness,
//! readiness, version, and metrics endpoints.
//!
//! Session continuity is carried by the `Mcp-Session-Id` header: the first
//! `initialize` call on a connection gets a fresh session id echoed back,
//! and subsequent calls on that connection pass it back unexamined by this
//! layer (session state itself lives in `gpumcp-server`).
//!
//! The outermost timeout in the hierarchy — response-write, 90 s — is
//! enforced here via [`tower_http::timeout::TimeoutLayer`]. The body-read
//! bound (≤ 30 s) is enforced here too, as the [`body_read_timeout`]
//! middleware, since that's the layer that actually drains the request
//! body. The tightest, innermost bound (header-read ≤ 10 s) is a
//! connection-level concern set on the hyper server builder where the
//! listener is constructed (`gpumcp-server`'s `McpServer::run`), since axum's
//! `Router` never sees a connection that hasn't finished reading its headers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use gpumcp_core::RequestContext;
use gpumcp_protocol::{JsonRpcRequest, JsonRpcResponse};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::handler::RequestHandler;

/// Response-write timeout: the outermost bound in the timeout hierarchy.
pub const RESPONSE_WRITE_TIMEOUT: Duration = Duration::from_secs(90);

/// Body-read timeout: the middle bound in the timeout hierarchy.
pub const BODY_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a buffered request body, to keep `body_read_timeout`
/// from holding an unbounded amount of memory while it waits.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Buffers the whole request body under [`BODY_READ_TIMEOUT`], failing the
/// request with `408 Request Timeout` if draining it takes longer. Runs
/// before route dispatch, so `Json<T>` extraction downstream always sees an
/// already-fully-read body.
async fn body_read_timeout(request: Request, next: Next) -> axum::response::Response {
    let (parts, body) = request.into_parts();
    let bytes = match tokio::time::timeout(BODY_READ_TIMEOUT, axum::body::to_bytes(body, MAX_BODY_BYTES)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            return (StatusCode::BAD_REQUEST, format!("could not read request body: {e}")).into_response();
        }
        Err(_) => {
            warn!(timeout_s = BODY_READ_TIMEOUT.as_secs(), "request body read timed out");
            return (StatusCode::REQUEST_TIMEOUT, "request body read timed out").into_response();
        }
    };
    let request = Request::from_parts(parts, Body::from(bytes));
    next.run(request).await
}

static SESSION_HEADER: HeaderName = HeaderName::from_static("mcp-session-id");

#[derive(Clone)]
struct AppState {
    handler: Arc<dyn RequestHandler>,
    /// Renders the live Prometheus text exposition (wired in `gpumcp-server`).
    metrics_render: Arc<dyn Fn() -> String + Send + Sync>,
    server_name: Arc<str>,
    version: &'static str,
}

/// Build the axum router serving this service's HTTP surface.
///
/// `metrics_render` produces the Prometheus text body on each `/metrics`
/// scrape; it is supplied by the caller so this crate never depends on the
/// concrete metrics registry type. `server_name` is this process's role
/// identity (e.g. `"gpumcp-agent"`), reported by `GET /version`.
pub fn router(
    handler: Arc<dyn RequestHandler>,
    metrics_render: Arc<dyn Fn() -> String + Send + Sync>,
    server_name: impl Into<Arc<str>>,
) -> Router {
    let state = AppState {
        handler,
        metrics_render,
        server_name: server_name.into(),
        version: env!("CARGO_PKG_VERSION"),
    };

    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/version", get(version))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(body_read_timeout))
        .layer(TimeoutLayer::new(RESPONSE_WRITE_TIMEOUT))
}

async fn mcp_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    trace!(method = %request.method, "http /mcp request");

    let session_id = headers
        .get(&SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext::new().with_metadata("session_id", session_id.clone());
    let response = state.handler.handle(request, ctx).await;

    let mut reply = Json(response).into_response();
    if let Ok(value) = HeaderValue::from_str(&session_id) {
        reply.headers_mut().insert(SESSION_HEADER.clone(), value);
    } else {
        warn!("session id contained characters invalid for a header value");
    }
    reply
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn readyz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ready" }))
}

async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "server": state.server_name.as_ref(),
        "version": state.version,
        "protocolVersion": gpumcp_protocol::PROTOCOL_VERSION,
    }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    ((StatusCode::OK, [("content-type", "text/plain; version=0.0.4")]), (state.metrics_render)())
}
