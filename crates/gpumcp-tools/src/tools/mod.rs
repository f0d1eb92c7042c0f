//! The concrete, NVML-backed agent tools.

pub mod describe_node;
pub mod health;
pub mod inventory;
pub mod pod_allocation;
pub mod xid;

pub use describe_node::DescribeGpuNode;
pub use health::GetGpuHealth;
pub use inventory::GetGpuInventory;
pub use pod_allocation::GetPodGpuAllocation;
pub use xid::AnalyzeXidErrors;

use std::sync::Arc;

use crate::agent_context::AgentContext;
use crate::registry::ToolRegistry;

/// Register every agent-role tool into a fresh registry.
#[must_use]
pub fn register_agent_tools(ctx: AgentContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GetGpuInventory::new(ctx.clone())));
    registry.register(Arc::new(GetGpuHealth::new(ctx.clone())));
    registry.register(Arc::new(AnalyzeXidErrors::new(ctx.clone())));
    registry.register(Arc::new(DescribeGpuNode::new(ctx.clone())));
    registry.register(Arc::new(GetPodGpuAllocation::new(ctx)));
    registry
}

/// Stable names of every agent-role tool, used by the gateway to know
/// which tool names to proxy.
pub const AGENT_TOOL_NAMES: [&str; 5] = [
    "get_gpu_inventory",
    "get_gpu_health",
    "analyze_xid_errors",
    "describe_gpu_node",
    "get_pod_gpu_allocation",
];
