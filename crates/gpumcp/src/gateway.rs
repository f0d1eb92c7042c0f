//! Gateway-role wiring: Kubernetes discovery, fan-out router, and the
//! proxy tool registry.

use std::sync::Arc;

use anyhow::Context;
use kube::Client;

use gpumcp_gateway::{
    AgentHttpClient, CircuitBreaker, ClusterInventoryHandler, ExecClient, GatewayConfig, GatewayRouter, ProxyToolHandler,
    RoutingMode,
};
use gpumcp_server::{McpServer, McpSession, Metrics, ServerConfig, ServerIdentity};
use gpumcp_tools::nvml::MockBackend;
use gpumcp_tools::{prompts, tools, AgentContext, ToolRegistry};

use crate::cli::Cli;

/// Assemble the gateway-role [`McpServer`] from parsed CLI flags.
pub async fn build(cli: &Cli) -> anyhow::Result<McpServer> {
    let client = Client::try_default().await.context("building Kubernetes client (in-cluster config or KUBECONFIG)")?;

    let gateway_config = GatewayConfig::from_env()
        .namespace(cli.namespace.clone().or(Some(gpumcp_gateway::discovery::DEFAULT_NAMESPACE.to_string())))
        .agent_port(cli.agent_port)
        .routing(cli.routing.into());

    tracing::info!(
        namespace = ?gateway_config.namespace,
        routing = ?gateway_config.routing,
        agent_port = gateway_config.agent_port,
        exec_timeout = ?gateway_config.exec_timeout,
        "gateway role configured"
    );

    let breaker = Arc::new(CircuitBreaker::default());
    let http = AgentHttpClient::default();
    let exec = matches!(gateway_config.routing, RoutingMode::Exec)
        .then(|| ExecClient::with_timeout(client.clone(), gateway_config.exec_timeout));

    let metrics = Metrics::install().context("installing Prometheus recorder")?;

    let router = Arc::new(GatewayRouter::with_discovery(
        client.clone(),
        gateway_config.namespace.clone(),
        gateway_config.label_selector.clone(),
        gateway_config.agent_port,
        breaker,
        http,
        exec,
        gateway_config.routing,
        metrics.clone(),
    ));

    let registry = build_proxy_registry(router, client);

    let config = ServerConfig::new("gpumcp-gateway", env!("CARGO_PKG_VERSION")).mode(cli.mode.into());
    let session = McpSession::new(
        ServerIdentity { name: config.name, version: config.version },
        Arc::new(registry),
        Arc::new(prompts::library()),
        metrics.clone(),
    );

    Ok(McpServer::new(session, metrics))
}

/// Build one proxy handler per agent tool name, specialising
/// `get_gpu_inventory` into [`ClusterInventoryHandler`] for its
/// Kubernetes-metadata enrichment.
///
/// Descriptors are sourced from a throwaway agent-tool registry (over a
/// [`MockBackend`] that's never called) since `descriptor()` only
/// describes the tool's name/schema, not live device state.
fn build_proxy_registry(router: Arc<GatewayRouter>, k8s_client: Client) -> ToolRegistry {
    let descriptor_source = tools::register_agent_tools(AgentContext::new(Arc::new(MockBackend::default()), "", ""));

    let mut registry = ToolRegistry::new();
    for name in tools::AGENT_TOOL_NAMES {
        let Some(handler) = descriptor_source.get(name) else { continue };
        let descriptor = handler.descriptor();

        if name == "get_gpu_inventory" {
            registry.register(Arc::new(ClusterInventoryHandler::new(router.clone(), Some(k8s_client.clone()))));
        } else {
            registry.register(Arc::new(ProxyToolHandler::new(descriptor, router.clone())));
        }
    }
    registry
}
