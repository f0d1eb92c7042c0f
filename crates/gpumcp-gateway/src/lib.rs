//! # gpumcp-gateway
//!
//! The cluster-wide half of the service: Kubernetes pod
//! discovery, per-node circuit breaking, a pooled retrying HTTP client (plus
//! an exec-based fallback transport), fan-out dispatch, and the proxy tool
//! handlers that make every remote agent tool look like a local one to the
//! `gpumcp-server` session core — including the specialised `get_gpu_inventory`
//! aggregation with Kubernetes node-metadata enrichment.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod circuit_breaker;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod http_client;
pub mod inventory;
pub mod proxy;
pub mod router;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use config::GatewayConfig;
pub use discovery::{discover_nodes, GpuNode, K8sNodeInfo};
pub use error::{GatewayError, GatewayResult};
pub use exec::ExecClient;
pub use http_client::AgentHttpClient;
pub use inventory::ClusterInventoryHandler;
pub use proxy::ProxyToolHandler;
pub use router::{GatewayRouter, NodeResult, RoutingMode};
