//! `get_gpu_inventory` cluster aggregation with Kubernetes enrichment.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use kube::Client;
use serde_json::Value;

use gpumcp_core::RequestContext;
use gpumcp_protocol::types::{CallToolRequest, RequestId, ToolInputSchema};
use gpumcp_protocol::{methods, JsonRpcRequest};
use gpumcp_tools::{ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};

use crate::discovery::{self, K8sNodeInfo};
use crate::proxy::decode_node_payload;
use crate::router::GatewayRouter;

/// Gateway-side `get_gpu_inventory`: fans the per-node inventory tool out
/// to every agent, then builds the `cluster_summary` and (when enabled and
/// a Kubernetes client is available) per-node `kubernetes` enrichment.
#[derive(Debug)]
pub struct ClusterInventoryHandler {
    router: Arc<GatewayRouter>,
    k8s_client: Option<Client>,
}

impl ClusterInventoryHandler {
    /// Build the handler. `k8s_client` of `None` means the gateway runs
    /// without Kubernetes metadata enrichment; the `kubernetes` block is
    /// then always omitted.
    #[must_use]
    pub fn new(router: Arc<GatewayRouter>, k8s_client: Option<Client>) -> Self {
        Self { router, k8s_client }
    }
}

fn schema() -> ToolInputSchema {
    let mut properties = std::collections::HashMap::new();
    properties.insert(
        "include_k8s_metadata".to_string(),
        serde_json::json!({
            "type": "boolean",
            "description": "Enrich each node entry with Kubernetes labels, conditions, and GPU capacity (default true).",
        }),
    );
    ToolInputSchema { schema_type: "object".to_string(), properties: Some(properties), required: None }
}

fn k8s_info_to_json(info: &K8sNodeInfo) -> Value {
    serde_json::json!({
        "labels": info.labels,
        "conditions": info.conditions,
        "capacity": info.gpu_capacity,
        "allocatable": info.gpu_allocatable,
        "allocated": info.gpu_allocated,
    })
}

#[async_trait]
impl ToolHandler for ClusterInventoryHandler {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_gpu_inventory".to_string(),
            description: "Cluster-wide GPU inventory: per-node device lists plus a cluster_summary, optionally \
            enriched with Kubernetes node metadata."
                .to_string(),
            input_schema: schema(),
        }
    }

    async fn handle(&self, ctx: &RequestContext, args: ToolArguments) -> ToolOutcome {
        let include_k8s_metadata = match args.bool_or("include_k8s_metadata", true) {
            Ok(v) => v,
            Err(e) => return ToolOutcome::failure(e.0),
        };

        let call = CallToolRequest { name: "get_gpu_inventory".to_string(), arguments: None };
        let request = match JsonRpcRequest::with_params(
            methods::CALL_TOOL,
            &call,
            RequestId::String(ctx.correlation_id.to_string()),
        ) {
            Ok(r) => r,
            Err(e) => return ToolOutcome::failure(format!("could not encode proxied call: {e}")),
        };

        let results = self.router.dispatch_all(ctx, &request).await;
        if results.is_empty() {
            return ToolOutcome::failure("no GPU nodes discovered to dispatch to");
        }

        let mut gpu_types = BTreeSet::new();
        let mut total_gpus = 0usize;
        let mut ready_nodes = 0usize;
        let mut node_entries = Vec::with_capacity(results.len());

        for result in &results {
            match decode_node_payload(&result.outcome) {
                Ok(data) => {
                    ready_nodes += 1;
                    let gpus = data.get("gpus").and_then(Value::as_array).cloned().unwrap_or_default();
                    total_gpus += gpus.len();
                    for gpu in &gpus {
                        if let Some(name) = gpu.get("name").and_then(Value::as_str) {
                            gpu_types.insert(name.to_string());
                        }
                    }

                    let mut entry = serde_json::json!({
                        "node_name": result.node,
                        "status": "ready",
                        "driver_version": data.get("driver_version"),
                        "cuda_version": data.get("cuda_version"),
                        "gpus": gpus,
                    });

                    if include_k8s_metadata {
                        if let Some(client) = &self.k8s_client {
                            match discovery::fetch_node_info(client, &result.node).await {
                                Ok(info) => {
                                    entry["kubernetes"] = k8s_info_to_json(&info);
                                }
                                Err(e) => {
                                    tracing::warn!(node = %result.node, error = %e, "could not fetch node metadata for inventory enrichment");
                                }
                            }
                        }
                    }

                    node_entries.push(entry);
                }
                Err(error) => {
                    node_entries.push(serde_json::json!({
                        "node_name": result.node,
                        "status": "error",
                        "error": error,
                    }));
                }
            }
        }

        if ready_nodes == 0 {
            return ToolOutcome::failure(format!("all {} node(s) failed to report inventory", results.len()));
        }

        ToolOutcome::ok(
            ToolStatus::Success,
            serde_json::json!({
                "cluster_summary": {
                "total_nodes": results.len(),
                "ready_nodes": ready_nodes,
                "total_gpus": total_gpus,
                "gpu_types": gpu_types.into_iter().collect::<Vec<_>>(),
                },
                "nodes": node_entries,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitBreaker;
    use crate::discovery::GpuNode;
    use crate::http_client::AgentHttpClient;
    use crate::router::RoutingMode;
    use gpumcp_server::Metrics;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn node_with_inventory(gpu_count: usize) -> (MockServer, GpuNode) {
        let server = MockServer::start().await;
        let gpus: Vec<Value> = (0..gpu_count)
            .map(|i| json!({"index": i, "name": "NVIDIA A100-SXM4-80GB", "uuid": format!("GPU-{i}")}))
            .collect();
        let body = json!({"node_name": "n", "driver_version": "535.104.05", "cuda_version": "12.2", "gpus": gpus, "warnings": [], "status": "success"});
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "result": {"content": [{"type": "text", "text": body.to_string()}]},
                "id": "abc"
            })))
            .mount(&server)
            .await;
        let addr = server.address();
        let node = GpuNode {
            node_name: "node-a".to_string(),
            pod_name: "node-a-agent".to_string(),
            namespace: "gpu-system".to_string(),
            pod_ip: addr.ip().to_string(),
            port: addr.port(),
            labels: BTreeMap::new(),
        };
        (server, node)
    }

    #[tokio::test]
    async fn aggregates_cluster_summary_across_nodes_without_k8s_client() {
        let (_server, node) = node_with_inventory(2).await;
        let router = Arc::new(GatewayRouter::new(
            vec![node],
            Arc::new(CircuitBreaker::default()),
            AgentHttpClient::new(1),
            None,
            RoutingMode::Http,
            Metrics::install().unwrap(),
        ));
        let handler = ClusterInventoryHandler::new(router, None);
        let outcome = handler.handle(&RequestContext::new(), ToolArguments::default()).await;
        assert_eq!(outcome.status, ToolStatus::Success);
        assert_eq!(outcome.body["cluster_summary"]["total_nodes"], 1);
        assert_eq!(outcome.body["cluster_summary"]["ready_nodes"], 1);
        assert_eq!(outcome.body["cluster_summary"]["total_gpus"], 2);
        assert_eq!(outcome.body["cluster_summary"]["gpu_types"].as_array().unwrap().len(), 1);
        assert!(outcome.body["nodes"][0].get("kubernetes").is_none());
    }

    #[tokio::test]
    async fn all_nodes_failing_is_a_hard_error() {
        let router = Arc::new(GatewayRouter::new(
            Vec::new(),
            Arc::new(CircuitBreaker::default()),
            AgentHttpClient::new(1),
            None,
            RoutingMode::Http,
            Metrics::install().unwrap(),
        ));
        let handler = ClusterInventoryHandler::new(router, None);
        let outcome = handler.handle(&RequestContext::new(), ToolArguments::default()).await;
        assert!(outcome.hard_error.is_some());
    }
}
