//! Graceful shutdown.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Bound on how long shutdown waits for in-flight work to drain once
/// cancellation fires.
pub const SHUTDOWN_DRAIN: Duration = Duration::from_secs(10);

/// Owns the process-wide shutdown signal. `token()` is handed to every
/// transport loop and fan-out dispatch so cancellation propagates
/// uniformly.
#[derive(Debug, Clone)]
pub struct ServerLifecycle {
    shutdown: CancellationToken,
}

impl Default for ServerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerLifecycle {
    /// Build a fresh lifecycle, not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self { shutdown: CancellationToken::new() }
    }

    /// The cancellation token to thread through transports and dispatch.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Trigger shutdown and wait up to [`SHUTDOWN_DRAIN`] for the supplied
    /// future (typically "all transport loops have returned") to resolve.
    pub async fn shutdown<F>(&self, drain: F)
    where
        F: std::future::Future<Output = ()>,
    {
        info!("shutdown requested, cancelling outstanding work");
        self.shutdown.cancel();
        match tokio::time::timeout(SHUTDOWN_DRAIN, drain).await {
            Ok(()) => info!("shutdown drained cleanly"),
            Err(_) => warn!(
                drain_seconds = SHUTDOWN_DRAIN.as_secs(),
                "shutdown drain timed out; exiting anyway"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_observes_cancellation() {
        let lifecycle = ServerLifecycle::new();
        let token = lifecycle.token();
        assert!(!token.is_cancelled());
        lifecycle.shutdown(async {}).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn shutdown_times_out_past_drain_bound_without_hanging() {
        let lifecycle = ServerLifecycle::new();
        let start = std::time::Instant::now();
        lifecycle.shutdown(std::future::pending::<()>()).await;
        assert!(start.elapsed() >= SHUTDOWN_DRAIN);
    }
}
