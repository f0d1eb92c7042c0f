//! Agent-role wiring: builds the NVML-backed tool registry and MCP session
//! core.

use std::sync::Arc;

use anyhow::Context;
use gpumcp_server::{McpServer, McpSession, Metrics, ServerConfig, ServerIdentity};
use gpumcp_tools::nvml::{MockBackend, RealBackend};
use gpumcp_tools::{prompts, tools, AgentContext};

use crate::cli::{Cli, NvmlKind};

/// Assemble the agent-role [`McpServer`] from parsed CLI flags.
pub fn build(cli: &Cli) -> anyhow::Result<McpServer> {
    let node_name = cli.node_name.clone().unwrap_or_else(|| "unknown-node".to_string());
    let pod_name = cli.pod_name.clone().unwrap_or_else(|| "unknown-pod".to_string());

    let nvml: Arc<dyn gpumcp_tools::nvml::NvmlBackend> = match cli.nvml {
        NvmlKind::Mock => Arc::new(MockBackend::default()),
        NvmlKind::Real => Arc::new(RealBackend),
    };

    let ctx = AgentContext::new(nvml, node_name, pod_name);
    let registry = tools::register_agent_tools(ctx);
    let metrics = Metrics::install().context("installing Prometheus recorder")?;

    let config = ServerConfig::new("gpumcp-agent", env!("CARGO_PKG_VERSION")).mode(cli.mode.into());
    tracing::info!(mode = %config.mode, nvml = ?cli.nvml, "agent role configured");

    let session = McpSession::new(
        ServerIdentity { name: config.name, version: config.version },
        Arc::new(registry),
        Arc::new(prompts::library()),
        metrics.clone(),
    );

    Ok(McpServer::new(session, metrics))
}
