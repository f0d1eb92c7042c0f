//! `analyze_xid_errors`: kernel-log NVRM Xid extraction.

use async_trait::async_trait;
use gpumcp_core::RequestContext;

use crate::agent_context::AgentContext;
use crate::kmsg::{self, KmsgRecord, XidEvent};
use crate::nvml::GpuDevice;
use crate::tool::{object_schema, ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};

/// Reads recent NVRM Xid lines from the kernel log and correlates each one
/// to a local GPU and a severity/SRE-action pair.
#[derive(Debug, Clone)]
pub struct AnalyzeXidErrors {
    ctx: AgentContext,
}

impl AnalyzeXidErrors {
    /// Build the tool over the given agent context.
    #[must_use]
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }
}

/// Pure aggregation step, factored out so it can be exercised directly
/// against a fixture without touching `/dev/kmsg`.
#[must_use]
pub fn build_outcome(records: &[KmsgRecord], devices: &[GpuDevice]) -> ToolOutcome {
    let mut events: Vec<XidEvent> = kmsg::extract_xid_events(records);
    kmsg::match_device_indices(&mut events, devices);

    let status = if events.iter().any(|e| e.severity == "fatal") {
        ToolStatus::Critical
    } else if events.iter().any(|e| e.severity == "warning") {
        ToolStatus::Warning
    } else {
        ToolStatus::Success
    };

    let payload: Vec<_> = events
        .iter()
        .map(|e| {
            serde_json::json!({
                "code": e.code,
                "pci_bus_id": e.pci_bus_id,
                "severity": e.severity,
                "sre_action": e.sre_action,
                "pid": e.pid,
                "process_name": e.process_name,
                "gpu_index": e.gpu_index,
            })
        })
        .collect();

    ToolOutcome::ok(status, serde_json::json!({ "events": payload }))
}

#[async_trait]
impl ToolHandler for AnalyzeXidErrors {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "analyze_xid_errors".to_string(),
            description: "Extract and interpret recent NVRM Xid errors from the kernel log.".to_string(),
            input_schema: object_schema(&[("time_range", "How far back to look, e.g. '1h'.")], &[]),
        }
    }

    async fn handle(&self, ctx: &RequestContext, _args: ToolArguments) -> ToolOutcome {
        if ctx.is_cancelled() {
            return ToolOutcome::failure("cancelled before reading kernel log");
        }

        let (records, source) = match kmsg::read_nvrm_records().await {
            Ok(result) => result,
            Err(e) => return ToolOutcome::failure(format!("kernel log read failed: {e}")),
        };

        let devices = self.ctx.nvml.all_devices().await.unwrap_or_default();
        let mut outcome = build_outcome(&records, &devices);
        if let serde_json::Value::Object(ref mut map) = outcome.body {
            map.insert(
                "source".to_string(),
                serde_json::Value::String(match source {
                    kmsg::KmsgSource::DevKmsg => "kmsg".to_string(),
                    kmsg::KmsgSource::Dmesg => "dmesg".to_string(),
                }),
            );
        }
        outcome
    }
}
