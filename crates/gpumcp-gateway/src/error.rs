//! Gateway-local error type.

/// Errors raised while discovering, dispatching to, or aggregating agents.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The Kubernetes API could not be reached or returned an error.
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    /// An agent's HTTP transport failed after retries.
    #[error("agent request to {node} failed after {attempts} attempt(s): {reason}")]
    AgentUnreachable {
        /// Node the request targeted.
        node: String,
        /// Number of attempts made.
        attempts: u32,
        /// Underlying failure reason.
        reason: String,
    },
    /// The node's circuit breaker is open; the request was not attempted.
    /// Message prefix is `"circuit open"` (never fed back into the breaker
    /// it names).
    #[error("circuit open (state: open, node: {0})")]
    CircuitOpen(String),
    /// The agent responded but the body could not be decoded as MCP JSON-RPC.
    #[error("malformed agent response from {node}: {reason}")]
    MalformedResponse {
        /// Node the response came from.
        node: String,
        /// Decode failure reason.
        reason: String,
    },
    /// No agent nodes were discovered to fan out to.
    #[error("no GPU nodes discovered")]
    NoNodesDiscovered,
}

/// Result alias for this crate.
pub type GatewayResult<T> = Result<T, GatewayError>;
