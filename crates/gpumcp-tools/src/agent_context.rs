//! Shared state handed to every agent-role tool: the NVML backend and this
//! node's identity.

use std::sync::Arc;

use crate::nvml::NvmlBackend;

/// State every agent tool closes over. Cheap to clone (an `Arc` and two
/// small strings); constructed once at startup and shared across all
/// registered tools.
#[derive(Clone)]
pub struct AgentContext {
    /// The NVML device backend (mock or real).
    pub nvml: Arc<dyn NvmlBackend>,
    /// This node's name, as Kubernetes knows it.
    pub node_name: String,
    /// This pod's name.
    pub pod_name: String,
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("node_name", &self.node_name)
            .field("pod_name", &self.pod_name)
            .finish_non_exhaustive()
    }
}

impl AgentContext {
    /// Build a new agent context.
    #[must_use]
    pub fn new(nvml: Arc<dyn NvmlBackend>, node_name: impl Into<String>, pod_name: impl Into<String>) -> Self {
        Self { nvml, node_name: node_name.into(), pod_name: pod_name.into() }
    }
}
