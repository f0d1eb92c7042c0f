//! `describe_gpu_node`: a one-shot human-readable node summary.

use async_trait::async_trait;
use gpumcp_core::RequestContext;

use crate::agent_context::AgentContext;
use crate::tool::{object_schema, ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};

/// Summarises this node's GPU fleet: counts, types, and aggregate utilization.
#[derive(Debug, Clone)]
pub struct DescribeGpuNode {
    ctx: AgentContext,
}

impl DescribeGpuNode {
    /// Build the tool over the given agent context.
    #[must_use]
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for DescribeGpuNode {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "describe_gpu_node".to_string(),
            description: "Summarise this node's GPU fleet: device count, types, and aggregate utilization."
                .to_string(),
            input_schema: object_schema(&[], &[]),
        }
    }

    async fn handle(&self, ctx: &RequestContext, _args: ToolArguments) -> ToolOutcome {
        let devices = match self.ctx.nvml.all_devices().await {
            Ok(d) => d,
            Err(e) => return ToolOutcome::failure(format!("could not enumerate devices: {e}")),
        };

        if ctx.is_cancelled() {
            return ToolOutcome::failure("cancelled before summarising device list");
        }

        let mut gpu_types: Vec<String> = devices.iter().map(|d| d.name.clone()).collect();
        gpu_types.sort();
        gpu_types.dedup();

        let total_memory_gb: f64 = devices.iter().map(|d| d.memory_total_gb).sum();
        let used_memory_gb: f64 = devices.iter().map(|d| d.memory_used_gb).sum();
        let avg_utilization = if devices.is_empty() {
            0.0
        } else {
            devices.iter().map(|d| f64::from(d.utilization_percent)).sum::<f64>() / devices.len() as f64
        };

        ToolOutcome::ok(
            ToolStatus::Success,
            serde_json::json!({
                "node_name": self.ctx.node_name,
                "pod_name": self.ctx.pod_name,
                "device_count": devices.len(),
                "gpu_types": gpu_types,
                "total_memory_gb": total_memory_gb,
                "used_memory_gb": used_memory_gb,
                "average_utilization_percent": avg_utilization,
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
    async fn summarises_mock_fleet() {
        let tool = DescribeGpuNode::new(AgentContext::new(Arc::new(MockBackend::default()), "node-a", "pod-a"));
        let outcome = tool.handle(&RequestContext::new(), ToolArguments::default()).await;
        assert_eq!(outcome.body["device_count"], 2);
        assert_eq!(outcome.body["gpu_types"].as_array().unwrap().len(), 1);
    }
}
