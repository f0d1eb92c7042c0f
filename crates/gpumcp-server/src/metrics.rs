//! Prometheus metrics.
//!
//! Backed by the `metrics` facade and `metrics-exporter-prometheus`. The
//! registry is process-global by construction — installed once in
//! [`Metrics::install`] and thereafter only observed, never restructured.

use std::time::Duration;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static INSTALLED: OnceCell<PrometheusHandle> = OnceCell::new();

/// Gateway fan-out latency histogram buckets, seconds.
pub const GATEWAY_LATENCY_BUCKETS: &[f64] =
    &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

const MCP_REQUESTS_TOTAL: &str = "mcp_requests_total";
const MCP_REQUEST_DURATION: &str = "mcp_request_duration_seconds";
const MCP_NODE_HEALTH: &str = "mcp_node_health";
const MCP_CIRCUIT_BREAKER_STATE: &str = "mcp_circuit_breaker_state";
const MCP_ACTIVE_REQUESTS: &str = "mcp_active_requests";
const MCP_GATEWAY_REQUEST_DURATION: &str = "mcp_gateway_request_duration_seconds";
const MCP_CIRCUIT_SKIPS_TOTAL: &str = "mcp_circuit_skips_total";

/// Handle to the installed Prometheus recorder. Cheap to clone; every
/// clone renders the same underlying registry.
#[derive(Debug, Clone)]
pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder and return a handle to it. Must be
    /// called exactly once per process; calling it twice
    /// returns an error from the underlying exporter, which is treated as
    /// a startup failure by the binary crate.
    pub fn install() -> Result<Self, metrics_exporter_prometheus::BuildError> {
        if let Some(handle) = INSTALLED.get() {
            return Ok(Self { handle: handle.clone() });
        }
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(MCP_GATEWAY_REQUEST_DURATION.to_string()), GATEWAY_LATENCY_BUCKETS)?
            .install_recorder()?;
        let _ = INSTALLED.set(handle.clone());
        Ok(Self { handle })
    }

    /// Render the current Prometheus text exposition for `GET /metrics`.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Record one MCP tool call.
    pub fn record_tool_call(&self, tool: &str, status: &str, duration: Duration) {
        metrics::counter!(MCP_REQUESTS_TOTAL, "tool" => tool.to_string(), "status" => status.to_string())
            .increment(1);
        metrics::histogram!(MCP_REQUEST_DURATION, "tool" => tool.to_string()).record(duration.as_secs_f64());
    }

    /// Adjust the in-flight request gauge by `delta` (+1 on entry, -1 on exit).
    pub fn adjust_active_requests(&self, delta: f64) {
        metrics::gauge!(MCP_ACTIVE_REQUESTS).increment(delta);
    }

    /// Report per-node liveness.
    pub fn set_node_health(&self, node: &str, healthy: bool) {
        metrics::gauge!(MCP_NODE_HEALTH, "node" => node.to_string()).set(if healthy { 1.0 } else { 0.0 });
    }

    /// Report the circuit breaker state for a node.
    pub fn set_circuit_breaker_state(&self, node: &str, state_value: f64) {
        metrics::gauge!(MCP_CIRCUIT_BREAKER_STATE, "node" => node.to_string()).set(state_value);
    }

    /// Record one gateway fan-out dispatch.
    pub fn record_gateway_dispatch(&self, node: &str, transport: &str, status: &str, duration: Duration) {
        metrics::histogram!(
            MCP_GATEWAY_REQUEST_DURATION,
            "node" => node.to_string(),
            "transport" => transport.to_string(),
            "status" => status.to_string(),
        )
            .record(duration.as_secs_f64());
    }

    /// Count one request skipped because a node's circuit breaker was open.
    pub fn record_circuit_skip(&self, node: &str) {
        metrics::counter!(MCP_CIRCUIT_SKIPS_TOTAL, "node" => node.to_string()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_set_matches_spec_exactly() {
        assert_eq!(
            GATEWAY_LATENCY_BUCKETS,
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
        );
    }
}
