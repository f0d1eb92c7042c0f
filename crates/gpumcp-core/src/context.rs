//! Per-request context: cancellation, correlation id, and free-form metadata.
//!
//! Every MCP session-core dispatch and every gateway fan-out call carries
//! one `RequestContext`. It is cloned cheaply (an `Arc`ed cancellation
//! token plus a handful of small fields) and threaded down into tool
//! handlers and the gateway router so that cancellation and the
//! correlation id propagate uniformly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::correlation::CorrelationId;

/// Context threaded through one MCP request from transport to tool handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id for this logical request.
    pub correlation_id: CorrelationId,

    /// When this request started, for duration accounting.
    pub start_time: Instant,

    /// Cancellation token; cancelled on client disconnect, transport
    /// timeout, or process shutdown. Every suspension point in an agent
    /// tool or the gateway fan-out must check this.
    cancellation: CancellationToken,

    /// Free-form metadata (node name being dispatched to, tool name,...)
    /// attached purely for logging; never consulted for control flow.
    metadata: Arc<HashMap<String, String>>,
}

impl RequestContext {
    /// Create a fresh context with a new correlation id and no parent cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: CorrelationId::generate(),
            start_time: Instant::now(),
            cancellation: CancellationToken::new(),
            metadata: Arc::new(HashMap::new()),
        }
    }

    /// Create a context carrying a pre-existing correlation id (e.g. one
    /// propagated in from an inbound HTTP header).
    #[must_use]
    pub fn with_correlation_id(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            ..Self::new()
        }
    }

    /// Derive a child context for one fan-out sub-request, sharing the
    /// parent's correlation id and cancellation token but tagged with
    /// per-node metadata for logging.
    #[must_use]
    pub fn child_for_node(&self, node: &str) -> Self {
        let mut metadata: HashMap<String, String> = (*self.metadata).clone();
        metadata.insert("node".to_string(), node.to_string());
        Self {
            correlation_id: self.correlation_id,
            start_time: Instant::now(),
            cancellation: self.cancellation.clone(),
            metadata: Arc::new(metadata),
        }
    }

    /// A child token that can be cancelled independently (used to enforce
    /// the kmsg read's 5s bound without cancelling the parent request).
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancellation.child_token()
    }

    /// True once this context (or an ancestor) has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Await cancellation. Used in `tokio::select!` against I/O futures so
    /// no suspension point holds a lock across an uncancellable wait.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Elapsed time since this context (or its root) was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Read a metadata value attached via [`RequestContext::child_for_node`]
    /// or [`RequestContext::with_metadata`].
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Builder-style metadata attachment.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut metadata: HashMap<String, String> = (*self.metadata).clone();
        metadata.insert(key.into(), value.into());
        self.metadata = Arc::new(metadata);
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_shares_correlation_id_and_cancellation() {
        let parent = RequestContext::new();
        let child = parent.child_for_node("node-a");
        assert_eq!(parent.correlation_id, child.correlation_id);
        assert_eq!(child.metadata("node"), Some("node-a"));

        parent.cancel();
        assert!(child.is_cancelled(), "cancelling the parent must cancel derived children");
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let ctx = RequestContext::new();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        ctx.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("should resolve promptly after cancel")
            .unwrap();
    }
}
