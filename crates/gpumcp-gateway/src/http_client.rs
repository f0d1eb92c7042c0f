//! Pooled HTTP client for dispatching MCP requests to agents, with
//! exponential-backoff retry.

use std::time::Duration;

use gpumcp_protocol::{JsonRpcRequest, JsonRpcResponse};

use crate::error::{GatewayError, GatewayResult};

/// Initial retry backoff.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
/// Backoff cap; doubles each attempt up to this.
pub const MAX_BACKOFF: Duration = Duration::from_secs(2);
/// Default number of attempts (the first try plus this many retries minus one).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
/// Overall per-request timeout, across all attempts.
pub const OVERALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Talks JSON-RPC-over-HTTP to one agent's `/mcp` endpoint, retrying
/// transient failures with exponential backoff up to [`DEFAULT_MAX_ATTEMPTS`].
#[derive(Debug, Clone)]
pub struct AgentHttpClient {
    client: reqwest::Client,
    max_attempts: u32,
}

impl Default for AgentHttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl AgentHttpClient {
    /// Build a client with a shared connection pool and the given retry budget.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(OVERALL_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("reqwest client with static TLS/DNS config always builds");
        Self { client, max_attempts: max_attempts.max(1) }
    }

    /// POST one JSON-RPC request to `base_url/mcp`, retrying on any
    /// transport failure or non-200 response with exponential backoff,
    /// up to `max_attempts`.
    pub async fn dispatch(&self, base_url: &str, request: &JsonRpcRequest) -> GatewayResult<JsonRpcResponse> {
        let url = format!("{base_url}/mcp");
        let mut backoff = INITIAL_BACKOFF;
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.try_once(&url, request).await {
                Ok(response) => return Ok(response),
                Err(Retryable::No(reason)) => {
                    return Err(GatewayError::AgentUnreachable {
                        node: base_url.to_string(),
                        attempts: attempt,
                        reason,
                    });
                }
                Err(Retryable::Yes(reason)) => {
                    last_error = reason;
                    if attempt < self.max_attempts {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        }

        Err(GatewayError::AgentUnreachable {
            node: base_url.to_string(),
            attempts: self.max_attempts,
            reason: last_error,
        })
    }

    async fn try_once(&self, url: &str, request: &JsonRpcRequest) -> Result<JsonRpcResponse, Retryable> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| Retryable::Yes(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Retryable::Yes(format!("non-200 response: {status}")));
        }

        response
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| Retryable::No(format!("could not decode response body: {e}")))
    }
}

enum Retryable {
    Yes(String),
    No(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpumcp_protocol::types::RequestId;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ping() -> JsonRpcRequest {
        JsonRpcRequest::with_params("tools/list", json!({}), RequestId::Number(1)).unwrap()
    }

    #[tokio::test]
    async fn successful_dispatch_returns_first_try() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "result": {"tools": []},
                "id": 1
            })))
            .mount(&server)
            .await;

        let client = AgentHttpClient::new(4);
        let response = client.dispatch(&server.uri(), &ping()).await.unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn client_error_is_retried_up_to_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(400))
            .expect(3)
            .mount(&server)
            .await;

        let client = AgentHttpClient::new(3);
        let err = client.dispatch(&server.uri(), &ping()).await.unwrap_err();
        assert!(matches!(err, GatewayError::AgentUnreachable { attempts: 3,.. }));
    }

    #[tokio::test]
    async fn server_error_is_retried_up_to_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = AgentHttpClient::new(3);
        let err = client.dispatch(&server.uri(), &ping()).await.unwrap_err();
        assert!(matches!(err, GatewayError::AgentUnreachable { attempts: 3,.. }));
    }
}
