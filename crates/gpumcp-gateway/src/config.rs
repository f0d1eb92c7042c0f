//! Gateway configuration.
//!
//! Populated by the binary crate from CLI flags and environment variables,
//! using the same builder pattern as `gpumcp-server`'s own `ServerConfig`.

use std::time::Duration;

use gpumcp_core::parse_or_default;

use crate::discovery::{DEFAULT_AGENT_PORT, DEFAULT_LABEL_SELECTOR, DEFAULT_NAMESPACE};
use crate::exec::DEFAULT_EXEC_TIMEOUT;
use crate::router::RoutingMode;

/// `EXEC_TIMEOUT` environment variable name.
pub const EXEC_TIMEOUT_ENV: &str = "EXEC_TIMEOUT";

/// Gateway-role configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Namespace searched for agent pods (`None` means cluster-wide).
    pub namespace: Option<String>,
    /// Label selector used to find agent pods.
    pub label_selector: String,
    /// Agent HTTP port, used when `routing` is [`RoutingMode::Http`].
    pub agent_port: u16,
    /// How the gateway reaches agent pods.
    pub routing: RoutingMode,
    /// Bound on one exec round trip, from `EXEC_TIMEOUT` or the default.
    pub exec_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            namespace: Some(DEFAULT_NAMESPACE.to_string()),
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            agent_port: DEFAULT_AGENT_PORT,
            routing: RoutingMode::Http,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Start from defaults, then layer `EXEC_TIMEOUT` from the process
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let raw = std::env::var(EXEC_TIMEOUT_ENV).ok();
        config.exec_timeout = parse_or_default(raw.as_deref(), DEFAULT_EXEC_TIMEOUT);
        config
    }

    /// Override the namespace (`None` = cluster-wide via `Api::all`).
    #[must_use]
    pub fn namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Override the label selector.
    #[must_use]
    pub fn label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = selector.into();
        self
    }

    /// Override the agent HTTP port.
    #[must_use]
    pub const fn agent_port(mut self, port: u16) -> Self {
        self.agent_port = port;
        self
    }

    /// Override the routing mode.
    #[must_use]
    pub const fn routing(mut self, routing: RoutingMode) -> Self {
        self.routing = routing;
        self
    }
}
