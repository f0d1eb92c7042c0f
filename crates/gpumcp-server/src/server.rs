//! Assembles the MCP session core with a selected transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gpumcp_transport::RequestHandler;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ServerResult;
use crate::metrics::Metrics;
use crate::session::McpSession;

/// Header-read timeout: the innermost bound in the timeout hierarchy
/// (spec: header-read ≤ 10 s < body-read ≤ 30 s < response-write ≤ 90 s).
/// Set on the HTTP/1 connection builder directly, since axum's `Router`
/// never sees a connection whose headers haven't finished arriving.
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on how long an in-flight connection is given to finish once
/// shutdown is requested, mirroring [`crate::lifecycle::SHUTDOWN_DRAIN`].
const CONNECTION_DRAIN: Duration = Duration::from_secs(10);

/// Which wire transport the process was started with.
#[derive(Debug, Clone)]
pub enum Transport {
    /// Line-delimited JSON-RPC over stdin/stdout.
    Stdio,
    /// Streaming HTTP on the given bind address.
    Http(SocketAddr),
}

/// Runs one [`McpSession`] over the selected transport until shutdown.
#[derive(Debug, Clone)]
pub struct McpServer {
    session: Arc<McpSession>,
    metrics: Metrics,
}

impl McpServer {
    /// Build a server around an already-assembled session core.
    #[must_use]
    pub fn new(session: McpSession, metrics: Metrics) -> Self {
        Self { session: Arc::new(session), metrics }
    }

    /// Run until the transport loop exits (stdin closed, EOF) or
    /// `shutdown` is cancelled.
    pub async fn run(&self, transport: Transport, shutdown: CancellationToken) -> ServerResult<()> {
        let handler: Arc<dyn RequestHandler> = self.session.clone();
        match transport {
            Transport::Stdio => {
                info!("serving MCP over stdio");
                gpumcp_transport::stdio::serve(handler, shutdown).await?;
            }
            Transport::Http(addr) => {
                info!(%addr, "serving MCP over HTTP");
                let metrics = self.metrics.clone();
                let server_name: Arc<str> = Arc::from(self.session.identity().name.as_str());
                let router = gpumcp_transport::http::router(
                    handler,
                    Arc::new(move || metrics.render()),
                    server_name,
                );
                let listener = tokio::net::TcpListener::bind(addr)
                    .await
                    .map_err(|e| gpumcp_transport::TransportError::Io(e.to_string()))?;

                let mut conn_builder = ConnBuilder::new(TokioExecutor::new());
                conn_builder.http1().header_read_timeout(HEADER_READ_TIMEOUT);
                let graceful = GracefulShutdown::new();

                loop {
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        accepted = listener.accept() => {
                            let (stream, peer) = match accepted {
                                Ok(pair) => pair,
                                Err(e) => {
                                    warn!(error = %e, "failed to accept HTTP connection");
                                    continue;
                                }
                            };
                            let io = TokioIo::new(stream);
                            let service = TowerToHyperService::new(router.clone());
                            let conn = graceful.watch(conn_builder.serve_connection(io, service));
                            tokio::spawn(async move {
                                if let Err(e) = conn.await {
                                    debug!(%peer, error = %e, "HTTP connection ended with an error");
                                }
                            });
                        }
                    }
                }

                tokio::select! {
                    () = graceful.shutdown() => info!("all HTTP connections drained"),
                    () = tokio::time::sleep(CONNECTION_DRAIN) => {
                        warn!(drain_seconds = CONNECTION_DRAIN.as_secs(), "HTTP drain timed out; dropping remaining connections");
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ServerIdentity;
    use gpumcp_tools::nvml::MockBackend;
    use gpumcp_tools::prompts::library;
    use gpumcp_tools::tools::register_agent_tools;
    use gpumcp_tools::AgentContext;

    #[test]
    fn server_can_be_constructed_for_either_transport() {
        let tools = register_agent_tools(AgentContext::new(Arc::new(MockBackend::default()), "n", "p"));
        let session = McpSession::new(
            ServerIdentity { name: "gpumcp-agent".to_string(), version: "0.1.0".to_string() },
            Arc::new(tools),
            Arc::new(library()),
            Metrics::install().expect("metrics install"),
        );
        let metrics = Metrics::install().expect("metrics install");
        let _server = McpServer::new(session, metrics);
        let _stdio = Transport::Stdio;
        let _http: Transport = Transport::Http("127.0.0.1:0".parse().unwrap());
    }
}
