//! Fan-out router: dispatches one MCP request to every discovered node and
//! aggregates the per-node results.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use kube::Client;
use parking_lot::RwLock;

use gpumcp_core::RequestContext;
use gpumcp_protocol::{JsonRpcRequest, JsonRpcResponse};
use gpumcp_server::Metrics;

use crate::circuit_breaker::CircuitBreaker;
use crate::discovery::{self, GpuNode};
use crate::error::{GatewayError, GatewayResult};
use crate::exec::ExecClient;
use crate::http_client::AgentHttpClient;

/// How the gateway reaches agent pods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMode {
    /// Direct HTTP to the pod IP.
    Http,
    /// `pods/exec` fallback for network-policy-restricted clusters.
    Exec,
}

impl RoutingMode {
    /// The transport label recorded on `mcp_gateway_request_duration_seconds`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Exec => "exec",
        }
    }
}

/// Outcome of dispatching to one node.
#[derive(Debug)]
pub struct NodeResult {
    /// Node the request targeted.
    pub node: String,
    /// Name of the agent pod on that node.
    pub pod_name: String,
    /// The agent's response, or the failure reason it could not be obtained.
    pub outcome: GatewayResult<JsonRpcResponse>,
}

/// Where a router's node list comes from.
///
/// A `GpuNode` list is re-derived each fan-out from a live cluster list,
/// never cached across calls. [`NodeSource::Discover`] does exactly that;
/// [`NodeSource::Static`] exists for tests and any embedding that already
/// has a fixed node set (e.g. a non-Kubernetes deployment).
#[derive(Debug)]
enum NodeSource {
    Static(RwLock<Vec<GpuNode>>),
    Discover { client: Client, namespace: Option<String>, label_selector: String, agent_port: u16 },
}

/// Fans a single JSON-RPC request out to every currently-known node,
/// consulting and updating the circuit breaker around each dispatch.
#[derive(Debug)]
pub struct GatewayRouter {
    source: NodeSource,
    breaker: Arc<CircuitBreaker>,
    http: AgentHttpClient,
    exec: Option<ExecClient>,
    mode: RoutingMode,
    metrics: Metrics,
}

impl GatewayRouter {
    /// Build a router over a fixed node list that never re-discovers.
    #[must_use]
    pub fn new(
        nodes: Vec<GpuNode>,
        breaker: Arc<CircuitBreaker>,
        http: AgentHttpClient,
        exec: Option<ExecClient>,
        mode: RoutingMode,
        metrics: Metrics,
    ) -> Self {
        if mode == RoutingMode::Exec {
            debug_assert!(exec.is_some(), "exec routing mode requires an ExecClient");
        }
        Self { source: NodeSource::Static(RwLock::new(nodes)), breaker, http, exec, mode, metrics }
    }

    /// Build a router that re-discovers its node list from the Kubernetes
    /// API on every [`Self::dispatch_all`] call.
    #[must_use]
    pub fn with_discovery(
        client: Client,
        namespace: Option<String>,
        label_selector: String,
        agent_port: u16,
        breaker: Arc<CircuitBreaker>,
        http: AgentHttpClient,
        exec: Option<ExecClient>,
        mode: RoutingMode,
        metrics: Metrics,
    ) -> Self {
        if mode == RoutingMode::Exec {
            debug_assert!(exec.is_some(), "exec routing mode requires an ExecClient");
        }
        Self {
            source: NodeSource::Discover { client, namespace, label_selector, agent_port },
            breaker,
            http,
            exec,
            mode,
            metrics,
        }
    }

    /// Replace the known node set. Only meaningful for a router built with
    /// [`Self::new`]; a no-op on a discovery-backed router, since that
    /// source re-derives its list on every dispatch.
    pub fn set_nodes(&self, nodes: Vec<GpuNode>) {
        if let NodeSource::Static(list) = &self.source {
            *list.write() = nodes;
        }
    }

    /// Currently known nodes: the fixed list for [`Self::new`], or a fresh
    /// discovery query for [`Self::with_discovery`].
    pub async fn nodes(&self) -> GatewayResult<Vec<GpuNode>> {
        match &self.source {
            NodeSource::Static(list) => Ok(list.read().clone()),
            NodeSource::Discover { client, namespace, label_selector, agent_port } => {
                discovery::discover_nodes(client, namespace.as_deref(), label_selector, *agent_port).await
            }
        }
    }

    /// Dispatch `request` to every known node in parallel, returning one
    /// [`NodeResult`] per node regardless of individual failures.
    pub async fn dispatch_all(&self, ctx: &RequestContext, request: &JsonRpcRequest) -> Vec<NodeResult> {
        let nodes = match self.nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!(error = %e, "node discovery failed for this fan-out");
                return Vec::new();
            }
        };
        if nodes.is_empty() {
            return Vec::new();
        }

        let futures = nodes.into_iter().map(|node| {
            let child_ctx = ctx.child_for_node(&node.node_name);
            self.dispatch_one(child_ctx, node, request)
        });

        join_all(futures).await
    }

    async fn dispatch_one(&self, ctx: RequestContext, node: GpuNode, request: &JsonRpcRequest) -> NodeResult {
        let node_name = node.node_name.clone();
        let pod_name = node.pod_name.clone();

        if !self.breaker.allow(&node_name) {
            self.metrics.set_circuit_breaker_state(&node_name, self.breaker.state(&node_name).as_metric_value());
            self.metrics.record_circuit_skip(&node_name);
            return NodeResult {
                node: node_name.clone(),
                pod_name,
                outcome: Err(GatewayError::CircuitOpen(node_name)),
            };
        }

        let started = Instant::now();
        let outcome = match self.mode {
            RoutingMode::Http => self.http.dispatch(&node.base_url(), request).await,
            RoutingMode::Exec => match &self.exec {
                Some(exec) => exec.dispatch(&node, request).await,
                None => Err(GatewayError::AgentUnreachable {
                    node: node_name.clone(),
                    attempts: 0,
                    reason: "exec routing selected with no ExecClient configured".to_string(),
                }),
            },
        };
        let elapsed = started.elapsed();

        let status = if outcome.is_ok() { "success" } else { "error" };
        self.metrics.record_gateway_dispatch(&node_name, self.mode.as_str(), status, elapsed);

        match &outcome {
            Ok(_) => {
                self.breaker.record_success(&node_name);
                self.metrics.set_node_health(&node_name, true);
            }
            Err(_) => {
                self.breaker.record_failure(&node_name);
                self.metrics.set_node_health(&node_name, false);
            }
        }
        self.metrics.set_circuit_breaker_state(&node_name, self.breaker.state(&node_name).as_metric_value());

        if ctx.is_cancelled() {
            tracing::debug!(node = %node_name, "request cancelled mid-dispatch");
        }

        NodeResult { node: node_name, pod_name, outcome }
    }
}
