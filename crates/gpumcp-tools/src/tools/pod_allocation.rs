//! `get_pod_gpu_allocation`: which processes currently hold a GPU context
//! on this node.
//!
//! The agent sees processes, not pods — mapping a PID back to a
//! Kubernetes pod identity requires the container runtime's cgroup
//! metadata, which is out of this core's scope. This tool reports the NVML-visible process list per
//! device; the gateway-side caller is expected to correlate PIDs to pods
//! using its own Kubernetes client if it needs that join.

use async_trait::async_trait;
use gpumcp_core::RequestContext;

use crate::agent_context::AgentContext;
use crate::tool::{object_schema, ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};

/// Lists the processes currently holding a GPU context on this node.
#[derive(Debug, Clone)]
pub struct GetPodGpuAllocation {
    ctx: AgentContext,
}

impl GetPodGpuAllocation {
    /// Build the tool over the given agent context.
    #[must_use]
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for GetPodGpuAllocation {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_pod_gpu_allocation".to_string(),
            description: "List processes currently holding a GPU context on this node, by device index."
                .to_string(),
            input_schema: object_schema(&[], &[]),
        }
    }

    async fn handle(&self, ctx: &RequestContext, _args: ToolArguments) -> ToolOutcome {
        let count = match self.ctx.nvml.device_count().await {
            Ok(n) => n,
            Err(e) => return ToolOutcome::failure(format!("could not query device count: {e}")),
        };

        let mut allocations = Vec::new();
        let mut warnings = Vec::new();

        for index in 0..count {
            if ctx.is_cancelled() {
                warnings.push(format!("cancelled before querying device {index}"));
                break;
            }
            match self.ctx.nvml.processes(index).await {
                Ok(processes) => {
                    for p in processes {
                        allocations.push(serde_json::json!({
                            "device_index": index,
                            "pid": p.pid,
                            "process_name": p.name,
                            "memory_used_mb": p.memory_used_mb,
                        }));
                    }
                }
                Err(e) => warnings.push(format!("device {index}: {e}")),
            }
        }

        let status = if !warnings.is_empty() && allocations.is_empty() {
            ToolStatus::Warning
        } else {
            ToolStatus::Success
        };

        ToolOutcome::ok(
            status,
            serde_json::json!({
                "node_name": self.ctx.node_name,
                "allocations": allocations,
                "warnings": warnings,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvml::MockBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_process_on_device_zero() {
        let tool = GetPodGpuAllocation::new(AgentContext::new(Arc::new(MockBackend::default()), "node-a", "pod-a"));
        let outcome = tool.handle(&RequestContext::new(), ToolArguments::default()).await;
        let allocations = outcome.body["allocations"].as_array().unwrap();
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0]["pid"], 4242);
    }
}
