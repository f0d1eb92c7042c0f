//! Per-node circuit breaker.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Default consecutive-failure threshold before a node trips open.
pub const DEFAULT_THRESHOLD: u32 = 3;
/// Default time an open breaker waits before allowing a probe.
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);

/// Breaker state for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Requests flow normally.
    Closed,
    /// Requests are denied; too many recent consecutive failures.
    Open,
    /// One probe request is allowed through to test recovery.
    HalfOpen,
}

impl BreakerState {
    /// Metric-friendly numeric encoding.
    #[must_use]
    pub fn as_metric_value(self) -> f64 {
        match self {
            Self::Closed => 0.0,
            Self::Open => 1.0,
            Self::HalfOpen => 2.0,
        }
    }
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
struct NodeState {
    state: BreakerState,
    failures: u32,
    last_failure: Option<Instant>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self { state: BreakerState::Closed, failures: 0, last_failure: None }
    }
}

/// Tracks per-node health across fan-out calls.
///
/// The whole map sits behind one `RwLock`: reads (`Allow`, `State`) take
/// the shared lock, writes (`RecordSuccess`, `RecordFailure`) take the
/// exclusive lock.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    reset_timeout: Duration,
    nodes: RwLock<HashMap<String, NodeState>>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_RESET_TIMEOUT)
    }
}

impl CircuitBreaker {
    /// Build a breaker with the given threshold and reset timeout.
    #[must_use]
    pub fn new(threshold: u32, reset_timeout: Duration) -> Self {
        Self { threshold, reset_timeout, nodes: RwLock::new(HashMap::new()) }
    }

    /// Whether a dispatch to `node` should proceed. `open` → `half-open`
    /// transitions happen inside this call, under the exclusive lock, so
    /// at most one caller observes the transition for a given elapsed
    /// window.
    pub fn allow(&self, node: &str) -> bool {
        {
            let nodes = self.nodes.read();
            match nodes.get(node) {
                None => return true,
                Some(entry) => {
                    if entry.state != BreakerState::Open {
                        return true;
                    }
                }
            }
        }

        let mut nodes = self.nodes.write();
        let entry = nodes.entry(node.to_string()).or_default();
        if entry.state != BreakerState::Open {
            return true;
        }
        let elapsed = entry.last_failure.map_or(Duration::MAX, |t| t.elapsed());
        if elapsed >= self.reset_timeout {
            entry.state = BreakerState::HalfOpen;
            true
        } else {
            false
        }
    }

    /// Record a successful dispatch: resets the node fully to `closed`.
    pub fn record_success(&self, node: &str) {
        let mut nodes = self.nodes.write();
        let entry = nodes.entry(node.to_string()).or_default();
        entry.state = BreakerState::Closed;
        entry.failures = 0;
        entry.last_failure = None;
    }

    /// Record a failed dispatch: increments the failure count and trips
    /// the breaker open once `threshold` is reached.
    pub fn record_failure(&self, node: &str) {
        let mut nodes = self.nodes.write();
        let entry = nodes.entry(node.to_string()).or_default();
        entry.failures += 1;
        entry.last_failure = Some(Instant::now());
        if entry.failures >= self.threshold {
            entry.state = BreakerState::Open;
        }
    }

    /// Current state for a node (defaults to `closed` if never observed).
    #[must_use]
    pub fn state(&self, node: &str) -> BreakerState {
        self.nodes.read().get(node).map_or(BreakerState::Closed, |e| e.state)
    }

    /// Force a node back to a fresh `closed` state.
    pub fn reset(&self, node: &str) {
        self.nodes.write().remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures_and_denies_until_reset() {
        let breaker = CircuitBreaker::new(3, Duration::from_millis(50));
        assert!(breaker.allow("node-a"));
        breaker.record_failure("node-a");
        breaker.record_failure("node-a");
        assert_eq!(breaker.state("node-a"), BreakerState::Closed);
        breaker.record_failure("node-a");
        assert_eq!(breaker.state("node-a"), BreakerState::Open);
        assert!(!breaker.allow("node-a"));
    }

    #[test]
    fn half_open_probe_allowed_after_reset_timeout_then_closes_on_success() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure("node-a");
        assert_eq!(breaker.state("node-a"), BreakerState::Open);
        assert!(!breaker.allow("node-a"));

        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.allow("node-a"));
        assert_eq!(breaker.state("node-a"), BreakerState::HalfOpen);

        breaker.record_success("node-a");
        assert_eq!(breaker.state("node-a"), BreakerState::Closed);
    }

    #[test]
    fn half_open_failure_reopens_the_breaker() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure("node-a");
        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.allow("node-a"));
        breaker.record_failure("node-a");
        assert_eq!(breaker.state("node-a"), BreakerState::Open);
    }

    #[test]
    fn unknown_node_defaults_to_closed_and_allowed() {
        let breaker = CircuitBreaker::default();
        assert_eq!(breaker.state("never-seen"), BreakerState::Closed);
        assert!(breaker.allow("never-seen"));
    }
}
