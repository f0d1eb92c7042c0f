//! Command-line surface: a single binary, role-selected.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use gpumcp_core::OperationMode;
use gpumcp_gateway::RoutingMode;

/// Which half of the service this process runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Per-node agent: owns the NVML binding and kernel-log tap.
    Agent,
    /// Cluster-wide gateway: fans requests out to every agent.
    Gateway,
}

/// Wire transport to serve MCP over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Line-delimited JSON-RPC over stdin/stdout.
    Stdio,
    /// Streaming HTTP.
    Http,
}

/// Which NVML backend the agent role uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NvmlKind {
    /// Real NVML bindings (external collaborator, not implemented here).
    Real,
    /// Fixed two-device fleet, for development and CI.
    Mock,
}

/// Gateway-only routing mode, mirrors [`RoutingMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoutingKind {
    /// Direct HTTP to each agent pod's IP.
    Http,
    /// `pods/exec` fallback.
    Exec,
}

impl From<RoutingKind> for RoutingMode {
    fn from(kind: RoutingKind) -> Self {
        match kind {
            RoutingKind::Http => Self::Http,
            RoutingKind::Exec => Self::Exec,
        }
    }
}

/// A single binary that selects its role from a flag.
#[derive(Debug, Parser)]
#[command(name = "gpumcp", version, about = "Kubernetes-resident NVIDIA GPU diagnostic MCP service")]
pub struct Cli {
    /// Which half of the service to run.
    #[arg(long, value_enum)]
    pub role: Role,

    /// Wire transport. Ignored (forced to stdio) when `--bind` is port 0
    /// or omitted.
    #[arg(long, value_enum, default_value = "stdio")]
    pub transport: TransportKind,

    /// HTTP bind address; port 0 forces stdio regardless of `--transport`.
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Whether mutating tools may run (none are shipped today; reserved).
    #[arg(long, value_enum, default_value = "read-only")]
    pub mode: ModeArg,

    /// NVML backend selection (agent role only).
    #[arg(long, value_enum, default_value = "mock")]
    pub nvml: NvmlKind,

    /// Agent-reach strategy (gateway role only).
    #[arg(long, value_enum, default_value = "http")]
    pub routing: RoutingKind,

    /// Namespace to search for agent pods (gateway role only; default
    /// matches the Helm chart's default install namespace).
    #[arg(long)]
    pub namespace: Option<String>,

    /// Agent HTTP port, used when `--routing http` (gateway role only).
    #[arg(long, default_value_t = gpumcp_gateway::discovery::DEFAULT_AGENT_PORT)]
    pub agent_port: u16,

    /// This node's name (agent role only; falls back to `$NODE_NAME`).
    #[arg(long, env = "NODE_NAME")]
    pub node_name: Option<String>,

    /// This pod's name (agent role only; falls back to `$POD_NAME`).
    #[arg(long, env = "POD_NAME")]
    pub pod_name: Option<String>,

    /// Increase log verbosity; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// `clap`-facing mirror of [`OperationMode`] (that type's own `FromStr`
/// already parses the same two strings; this wrapper just gets us
/// `ValueEnum` without adding a `clap` dependency to `gpumcp-core`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Only diagnostic tools are registered.
    #[value(name = "read-only")]
    ReadOnly,
    /// Mutating tools, if any, are permitted.
    Operator,
}

impl From<ModeArg> for OperationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::ReadOnly => Self::ReadOnly,
            ModeArg::Operator => Self::Operator,
        }
    }
}

impl Cli {
    /// Resolve the transport, applying the "port 0 forces stdio" rule.
    #[must_use]
    pub fn resolve_transport(&self) -> gpumcp_server::Transport {
        match self.bind {
            Some(addr) if addr.port() != 0 => gpumcp_server::Transport::Http(addr),
            _ => gpumcp_server::Transport::Stdio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_zero_forces_stdio_even_with_http_requested() {
        let cli = Cli::parse_from([
            "gpumcp",
            "--role",
            "agent",
            "--transport",
            "http",
            "--bind",
            "0.0.0.0:0",
        ]);
        assert!(matches!(cli.resolve_transport(), gpumcp_server::Transport::Stdio));
    }

    #[test]
    fn omitted_bind_defaults_to_stdio() {
        let cli = Cli::parse_from(["gpumcp", "--role", "agent"]);
        assert!(matches!(cli.resolve_transport(), gpumcp_server::Transport::Stdio));
    }

    #[test]
    fn nonzero_port_selects_http() {
        let cli = Cli::parse_from(["gpumcp", "--role", "gateway", "--bind", "0.0.0.0:8080"]);
        assert!(matches!(cli.resolve_transport(), gpumcp_server::Transport::Http(_)));
    }

    #[test]
    fn mode_arg_converts_to_operation_mode() {
        assert_eq!(OperationMode::from(ModeArg::ReadOnly), OperationMode::ReadOnly);
        assert_eq!(OperationMode::from(ModeArg::Operator), OperationMode::Operator);
    }

    #[test]
    fn routing_kind_converts_to_routing_mode() {
        assert_eq!(RoutingMode::from(RoutingKind::Http), RoutingMode::Http);
        assert_eq!(RoutingMode::from(RoutingKind::Exec), RoutingMode::Exec);
    }
}
