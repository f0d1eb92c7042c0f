//! Exec-based fallback transport.
//!
//! Some clusters' `NetworkPolicy` blocks gateway → agent pod-IP traffic but
//! still allows the Kubernetes API's `pods/exec` subresource. In that mode
//! the gateway never dials the agent over HTTP: it execs the agent binary
//! itself inside the target pod in its "oneshot" stdio contract and writes
//! both JSON-RPC requests, LF-terminated, to the attached stdin, reading the
//! two LF-terminated responses back off stdout. The `tools/call` response is
//! what's returned; `initialize`'s response is read and discarded, same as
//! the stdio transport's own handshake.

use std::time::Duration;

use futures::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams};
use kube::Client;

use gpumcp_core::PROTOCOL_VERSION;
use gpumcp_protocol::types::{ClientCapabilities, Implementation, InitializeRequest, RequestId};
use gpumcp_protocol::{methods, JsonRpcRequest, JsonRpcResponse};

use crate::discovery::GpuNode;
use crate::error::{GatewayError, GatewayResult};

/// Command run inside the agent pod for one-shot exec dispatch.
pub const AGENT_ONESHOT_COMMAND: [&str; 3] = ["gpumcp", "--role", "agent"];
/// Default bound on one exec round trip if `EXEC_TIMEOUT` is unset or
/// invalid.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(60);

/// Dispatches JSON-RPC requests to agents via `pods/exec` instead of HTTP.
#[derive(Debug, Clone)]
pub struct ExecClient {
    client: Client,
    timeout: Duration,
}

impl ExecClient {
    /// Build an exec client over the given Kubernetes client with the
    /// default per-request timeout.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_timeout(client, DEFAULT_EXEC_TIMEOUT)
    }

    /// Build an exec client with an explicit timeout, typically parsed from
    /// the `EXEC_TIMEOUT` environment variable.
    #[must_use]
    pub fn with_timeout(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Run one JSON-RPC request against `node`'s agent pod over exec,
    /// preceded by the `initialize` handshake the oneshot contract requires.
    pub async fn dispatch(&self, node: &GpuNode, request: &JsonRpcRequest) -> GatewayResult<JsonRpcResponse> {
        match tokio::time::timeout(self.timeout, self.dispatch_inner(node, request)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::AgentUnreachable {
                node: node.node_name.clone(),
                attempts: 1,
                reason: format!("exec dispatch exceeded {:?}", self.timeout),
            }),
        }
    }

    async fn dispatch_inner(&self, node: &GpuNode, request: &JsonRpcRequest) -> GatewayResult<JsonRpcResponse> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &node.namespace);
        let params = AttachParams::default().stdin(true).stdout(true).stderr(false);

        let mut attached = pods
            .exec(&node.pod_name, AGENT_ONESHOT_COMMAND, &params)
            .await
            .map_err(GatewayError::Kube)?;

        let mut stdin = attached.stdin().ok_or_else(|| GatewayError::MalformedResponse {
            node: node.node_name.clone(),
            reason: "exec stream has no stdin writer".to_string(),
        })?;
        let stdout = attached.stdout().ok_or_else(|| GatewayError::MalformedResponse {
            node: node.node_name.clone(),
            reason: "exec stream has no stdout reader".to_string(),
        })?;
        let mut lines = BufReader::new(stdout).lines();

        let initialize = initialize_request();
        write_line(&mut stdin, &initialize, &node.node_name).await?;
        write_line(&mut stdin, request, &node.node_name).await?;
        stdin.close().await.map_err(|e| GatewayError::AgentUnreachable {
            node: node.node_name.clone(),
            attempts: 1,
            reason: format!("exec stdin close failed: {e}"),
        })?;

        // First line is the `initialize` response; read and discard it.
        read_line(&mut lines, &node.node_name).await?;
        let response_line = read_line(&mut lines, &node.node_name).await?;

        attached.join().await.map_err(GatewayError::Kube)?;

        serde_json::from_str(&response_line).map_err(|e| GatewayError::MalformedResponse {
            node: node.node_name.clone(),
            reason: format!("could not decode exec response: {e}"),
        })
    }
}

fn initialize_request() -> JsonRpcRequest {
    let params = InitializeRequest {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation { name: "gpumcp-gateway".to_string(), version: env!("CARGO_PKG_VERSION").to_string() },
    };
    JsonRpcRequest::with_params(methods::INITIALIZE, params, RequestId::Number(0))
        .expect("InitializeRequest always serializes")
}

async fn write_line<W>(writer: &mut W, request: &JsonRpcRequest, node: &str) -> GatewayResult<()>
where
    W: futures::AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(request).map_err(|e| GatewayError::MalformedResponse {
        node: node.to_string(),
        reason: format!("could not encode request: {e}"),
    })?;
    payload.push(b'\n');
    writer.write_all(&payload).await.map_err(|e| GatewayError::AgentUnreachable {
        node: node.to_string(),
        attempts: 1,
        reason: format!("exec stdin write failed: {e}"),
    })
}

async fn read_line<R>(lines: &mut futures::io::Lines<R>, node: &str) -> GatewayResult<String>
where
    R: futures::AsyncBufRead + Unpin,
{
    use futures::StreamExt;
    match lines.next().await {
        Some(Ok(line)) => Ok(line),
        Some(Err(e)) => Err(GatewayError::AgentUnreachable {
            node: node.to_string(),
            attempts: 1,
            reason: format!("exec stdout read failed: {e}"),
        }),
        None => Err(GatewayError::MalformedResponse {
            node: node.to_string(),
            reason: "exec stream closed before a response line was seen".to_string(),
        }),
    }
}
