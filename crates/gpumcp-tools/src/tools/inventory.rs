//! `get_gpu_inventory`: per-node device inventory.

use async_trait::async_trait;
use gpumcp_core::RequestContext;

use crate::agent_context::AgentContext;
use crate::tool::{object_schema, ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};

/// Lists every GPU on this node with its identity and live telemetry.
#[derive(Debug, Clone)]
pub struct GetGpuInventory {
    ctx: AgentContext,
}

impl GetGpuInventory {
    /// Build the tool over the given agent context.
    #[must_use]
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for GetGpuInventory {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_gpu_inventory".to_string(),
            description: "List every GPU on this node with identity, memory, temperature, and utilization."
                .to_string(),
            input_schema: object_schema(&[], &[]),
        }
    }

    async fn handle(&self, ctx: &RequestContext, _args: ToolArguments) -> ToolOutcome {
        let count = match self.ctx.nvml.device_count().await {
            Ok(n) => n,
            Err(e) => return ToolOutcome::failure(format!("could not query device count: {e}")),
        };

        let mut gpus = Vec::new();
        let mut warnings = Vec::new();
        let mut driver_version = None;
        let mut cuda_version = None;

        for index in 0..count {
            if ctx.is_cancelled() {
                warnings.push(format!("cancelled before querying device {index}"));
                break;
            }
            match self.ctx.nvml.device(index).await {
                Ok(device) => {
                    driver_version.get_or_insert_with(|| device.driver_version.clone());
                    cuda_version.get_or_insert_with(|| device.cuda_version.clone());
                    gpus.push(serde_json::json!({
                        "index": device.index,
                        "name": device.name,
                        "uuid": device.uuid,
                        "memory_total_gb": device.memory_total_gb,
                        "temperature_c": device.temperature_c,
                        "utilization_percent": device.utilization_percent,
                    }));
                }
                Err(e) => warnings.push(format!("device {index}: {e}")),
            }
        }

        let status = if !warnings.is_empty() && gpus.is_empty() {
            ToolStatus::Error
        } else if !warnings.is_empty() {
            ToolStatus::Warning
        } else {
            ToolStatus::Success
        };

        ToolOutcome::ok(
            status,
            serde_json::json!({
                "node_name": self.ctx.node_name,
                "driver_version": driver_version,
                "cuda_version": cuda_version,
                "gpus": gpus,
                "warnings": warnings,
            }),
        )
    }
}
