//! Kubernetes node/pod discovery.
//!
//! The gateway fans out to one agent pod per GPU-bearing node. Discovery
//! lists agent pods by label selector, keeping only those whose `Ready`
//! condition is true and that carry a pod IP, then maps each to the node
//! it's scheduled on.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, ListParams};
use kube::Client;

use crate::error::{GatewayError, GatewayResult};

/// Label prefixes and exact names kept in `kubernetes.labels` enrichment
///: anything else is noise for a GPU-diagnostic payload.
const KEPT_LABEL_PREFIXES: &[&str] = &["nvidia.com/", "topology.kubernetes.io/"];
const KEPT_LABEL_EXACT: &[&str] =
    &["node.kubernetes.io/instance-type", "kubernetes.io/arch", "kubernetes.io/os", "gpu-type", "accelerator"];

/// The node-level GPU capacity/allocatable resource name.
const NVIDIA_GPU_RESOURCE: &str = "nvidia.com/gpu";

/// Kubernetes node metadata used to enrich a `get_gpu_inventory` aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct K8sNodeInfo {
    /// GPU-relevant labels only (see [`KEPT_LABEL_PREFIXES`]/[`KEPT_LABEL_EXACT`]).
    pub labels: BTreeMap<String, String>,
    /// Each node condition type mapped to whether its status is `"True"`.
    pub conditions: BTreeMap<String, bool>,
    /// `nvidia.com/gpu` capacity reported by the node, if any.
    pub gpu_capacity: Option<f64>,
    /// `nvidia.com/gpu` allocatable reported by the node, if any.
    pub gpu_allocatable: Option<f64>,
    /// `nvidia.com/gpu` requested by non-terminal pods scheduled on this
    /// node, summed. Falls back to `capacity - allocatable` by the caller
    /// when pod enumeration fails.
    pub gpu_allocated: Option<f64>,
}

fn keep_label(key: &str) -> bool {
    KEPT_LABEL_EXACT.contains(&key) || KEPT_LABEL_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

fn quantity_as_f64(q: &k8s_openapi::apimachinery::pkg::api::resource::Quantity) -> Option<f64> {
    q.0.parse().ok()
}

/// Fetch one node's labels, conditions, and GPU capacity/allocatable, plus
/// the sum of `nvidia.com/gpu` requested by non-terminal pods scheduled on
/// it.
pub async fn fetch_node_info(client: &Client, node_name: &str) -> GatewayResult<K8sNodeInfo> {
    let nodes: Api<Node> = Api::all(client.clone());
    let node = nodes.get(node_name).await.map_err(GatewayError::Kube)?;

    let labels = node
        .metadata
        .labels
        .unwrap_or_default()
        .into_iter()
        .filter(|(k, _)| keep_label(k))
        .collect::<BTreeMap<_, _>>();

    let status = node.status.unwrap_or_default();
    let conditions = status
        .conditions
        .unwrap_or_default()
        .into_iter()
        .map(|c| (c.type_, c.status == "True"))
        .collect::<BTreeMap<_, _>>();

    let gpu_capacity = status.capacity.as_ref().and_then(|c| c.get(NVIDIA_GPU_RESOURCE)).and_then(quantity_as_f64);
    let gpu_allocatable =
        status.allocatable.as_ref().and_then(|c| c.get(NVIDIA_GPU_RESOURCE)).and_then(quantity_as_f64);

    let gpu_allocated = match sum_requested_gpus(client, node_name).await {
        Ok(sum) => Some(sum),
        Err(_) => match (gpu_capacity, gpu_allocatable) {
            (Some(cap), Some(alloc)) => Some((cap - alloc).max(0.0)),
            _ => None,
        },
    };

    Ok(K8sNodeInfo { labels, conditions, gpu_capacity, gpu_allocatable, gpu_allocated })
}

const TERMINAL_PHASES: &[&str] = &["Succeeded", "Failed"];

async fn sum_requested_gpus(client: &Client, node_name: &str) -> GatewayResult<f64> {
    let pods: Api<Pod> = Api::all(client.clone());
    let params = ListParams::default().fields(&format!("spec.nodeName={node_name}"));
    let list = pods.list(&params).await.map_err(GatewayError::Kube)?;

    let mut total = 0.0;
    for pod in list.items {
        let phase = pod.status.as_ref().and_then(|s| s.phase.clone()).unwrap_or_default();
        if TERMINAL_PHASES.contains(&phase.as_str()) {
            continue;
        }
        let Some(spec) = &pod.spec else { continue };
        for container in &spec.containers {
            if let Some(requests) = container.resources.as_ref().and_then(|r| r.requests.as_ref()) {
                if let Some(qty) = requests.get(NVIDIA_GPU_RESOURCE).and_then(quantity_as_f64) {
                    total += qty;
                }
            }
        }
    }
    Ok(total)
}

/// Default label selector used to find agent pods, matching the label a
/// Helm chart deploying the agent DaemonSet would apply.
pub const DEFAULT_LABEL_SELECTOR: &str = "app.kubernetes.io/name=gpu-mcp-agent";

/// Default namespace searched for agent pods.
pub const DEFAULT_NAMESPACE: &str = "gpu-operator";

/// Default agent HTTP port.
pub const DEFAULT_AGENT_PORT: u16 = 8080;

/// One discovered GPU node and how to reach its agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuNode {
    /// Kubernetes node name.
    pub node_name: String,
    /// Name of the agent pod scheduled on this node.
    pub pod_name: String,
    /// Namespace the agent pod lives in.
    pub namespace: String,
    /// Pod IP the agent's HTTP transport listens on.
    pub pod_ip: String,
    /// Port the agent's HTTP transport listens on.
    pub port: u16,
    /// Arbitrary node labels, kept for inventory enrichment.
    pub labels: BTreeMap<String, String>,
}

impl GpuNode {
    /// Base URL for this node's agent (e.g. `http://10.0.1.4:8080`).
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.pod_ip, self.port)
    }
}

/// Discover ready agent pods across the cluster (or one namespace).
///
/// `namespace` of `None` lists cluster-wide via `Api::all`, matching
/// deployments where the gateway has cluster-scoped RBAC.
pub async fn discover_nodes(
    client: &Client,
    namespace: Option<&str>,
    label_selector: &str,
    agent_port: u16,
) -> GatewayResult<Vec<GpuNode>> {
    let pods: Api<Pod> = match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    let params = ListParams::default().labels(label_selector);
    let list = pods.list(&params).await.map_err(GatewayError::Kube)?;

    let mut nodes = Vec::new();
    for pod in list.items {
        let Some(node) = pod_to_gpu_node(&pod, agent_port) else { continue };
        nodes.push(node);
    }
    Ok(nodes)
}

fn pod_to_gpu_node(pod: &Pod, agent_port: u16) -> Option<GpuNode> {
    let metadata = &pod.metadata;
    let pod_name = metadata.name.clone()?;
    let namespace = metadata.namespace.clone().unwrap_or_else(|| "default".to_string());
    let labels = metadata
        .labels
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect::<BTreeMap<_, _>>();

    let spec = pod.spec.as_ref()?;
    let node_name = spec.node_name.clone()?;

    let status = pod.status.as_ref()?;
    let pod_ip = status.pod_ip.clone()?;
    let ready = status
        .conditions
        .as_ref()
        .map(|conds| conds.iter().any(|c| c.type_ == "Ready" && c.status == "True"))
        .unwrap_or(false);
    if !ready {
        return None;
    }

    Some(GpuNode { node_name, pod_name, namespace, pod_ip, port: agent_port, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{PodCondition, PodSpec, PodStatus};
    use kube::core::ObjectMeta;

    fn ready_pod(name: &str, node: &str, ip: &str) -> Pod {
        Pod {
            metadata: ObjectMeta { name: Some(name.to_string()), namespace: Some("gpu-system".to_string()),..Default::default() },
            spec: Some(PodSpec { node_name: Some(node.to_string()),..Default::default() }),
            status: Some(PodStatus {
                pod_ip: Some(ip.to_string()),
                conditions: Some(vec![PodCondition {
                    type_: "Ready".to_string(),
                    status: "True".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn maps_ready_pod_to_gpu_node() {
        let pod = ready_pod("gpumcp-agent-abcde", "node-1", "10.0.1.4");
        let node = pod_to_gpu_node(&pod, DEFAULT_AGENT_PORT).unwrap();
        assert_eq!(node.node_name, "node-1");
        assert_eq!(node.pod_ip, "10.0.1.4");
        assert_eq!(node.base_url(), "http://10.0.1.4:8080");
    }

    #[test]
    fn maps_ready_pod_using_the_configured_agent_port() {
        let pod = ready_pod("gpumcp-agent-abcde", "node-1", "10.0.1.4");
        let node = pod_to_gpu_node(&pod, 9100).unwrap();
        assert_eq!(node.port, 9100);
        assert_eq!(node.base_url(), "http://10.0.1.4:9100");
    }

    #[test]
    fn not_ready_pod_is_skipped() {
        let mut pod = ready_pod("gpumcp-agent-xyz", "node-2", "10.0.1.5");
        pod.status.as_mut().unwrap().conditions.as_mut().unwrap()[0].status = "False".to_string();
        assert!(pod_to_gpu_node(&pod, DEFAULT_AGENT_PORT).is_none());
    }

    #[test]
    fn pod_without_ip_is_skipped() {
        let mut pod = ready_pod("gpumcp-agent-noip", "node-3", "10.0.1.6");
        pod.status.as_mut().unwrap().pod_ip = None;
        assert!(pod_to_gpu_node(&pod, DEFAULT_AGENT_PORT).is_none());
    }

    #[test]
    fn keep_label_matches_prefixes_and_exact_names() {
        assert!(keep_label("nvidia.com/gpu.product"));
        assert!(keep_label("topology.kubernetes.io/zone"));
        assert!(keep_label("kubernetes.io/arch"));
        assert!(keep_label("gpu-type"));
        assert!(!keep_label("kubernetes.io/hostname"));
        assert!(!keep_label("some-unrelated-label"));
    }

    #[test]
    fn quantity_parses_plain_integer_string() {
        let qty = k8s_openapi::apimachinery::pkg::api::resource::Quantity("4".to_string());
        assert_eq!(quantity_as_f64(&qty), Some(4.0));
    }
}
