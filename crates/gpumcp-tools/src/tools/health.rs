//! `get_gpu_health`: per-device health assessment.

use async_trait::async_trait;
use gpumcp_core::RequestContext;

use crate::agent_context::AgentContext;
use crate::tool::{object_schema, ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};

/// Thresholds used to classify a device's health from its live telemetry.
/// Conservative defaults; not currently exposed as a tool input, since the
/// contract for this tool only fixes the payload layout, not its
/// thresholds.
const TEMP_WARNING_C: u32 = 80;
const TEMP_CRITICAL_C: u32 = 90;

/// Reports a health verdict for every GPU on this node.
#[derive(Debug, Clone)]
pub struct GetGpuHealth {
    ctx: AgentContext,
}

impl GetGpuHealth {
    /// Build the tool over the given agent context.
    #[must_use]
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }
}

fn classify(temperature_c: u32, healthy: bool) -> &'static str {
    if !healthy {
        "critical"
    } else if temperature_c >= TEMP_CRITICAL_C {
        "critical"
    } else if temperature_c >= TEMP_WARNING_C {
        "warning"
    } else {
        "healthy"
    }
}

#[async_trait]
impl ToolHandler for GetGpuHealth {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_gpu_health".to_string(),
            description: "Report a health verdict (healthy/warning/critical) for every GPU on this node."
                .to_string(),
            input_schema: object_schema(&[], &[]),
        }
    }

    async fn handle(&self, ctx: &RequestContext, _args: ToolArguments) -> ToolOutcome {
        let count = match self.ctx.nvml.device_count().await {
            Ok(n) => n,
            Err(e) => return ToolOutcome::failure(format!("could not query device count: {e}")),
        };

        let mut devices = Vec::new();
        let mut worst = ToolStatus::Success;

        for index in 0..count {
            if ctx.is_cancelled() {
                break;
            }
            match self.ctx.nvml.device(index).await {
                Ok(device) => {
                    let verdict = classify(device.temperature_c, device.healthy);
                    if verdict == "critical" {
                        worst = ToolStatus::Critical;
                    } else if verdict == "warning" && worst == ToolStatus::Success {
                        worst = ToolStatus::Warning;
                    }
                    devices.push(serde_json::json!({
                        "index": device.index,
                        "uuid": device.uuid,
                        "temperature_c": device.temperature_c,
                        "verdict": verdict,
                    }));
                }
                Err(e) => {
                    worst = ToolStatus::Degraded;
                    devices.push(serde_json::json!({
                        "index": index,
                        "verdict": "unknown",
                        "error": e.to_string(),
                    }));
                }
            }
        }

        ToolOutcome::ok(worst, serde_json::json!({ "node_name": self.ctx.node_name, "devices": devices }))
    }
}
