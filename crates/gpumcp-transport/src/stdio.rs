//! Standard I/O transport: one JSON-RPC request per line in on stdin, one
//! JSON-RPC response per line out on stdout.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use gpumcp_core::RequestContext;
use gpumcp_protocol::{JsonRpcError, JsonRpcErrorCode, JsonRpcRequest, JsonRpcResponse};
use tokio::io::{BufReader, Stdin, Stdout};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::error::{TransportError, TransportResult};
use crate::handler::RequestHandler;

/// Run the stdio transport loop until stdin closes or `shutdown` fires.
///
/// Each line is parsed as a [`JsonRpcRequest`]; a line that fails to parse
/// gets a JSON-RPC parse-error response rather than killing the loop, since
/// one malformed line from a misbehaving client should not take down the
/// session for every other line already queued.
pub async fn serve(handler: Arc<dyn RequestHandler>, shutdown: CancellationToken) -> TransportResult<()> {
    let stdin = tokio::io::stdin();
    let mut reader: FramedRead<BufReader<Stdin>, LinesCodec> =
        FramedRead::new(BufReader::new(stdin), LinesCodec::new());

    let stdout = tokio::io::stdout();
    let mut writer: FramedWrite<Stdout, LinesCodec> = FramedWrite::new(stdout, LinesCodec::new());

    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => {
                debug!("stdio transport shutting down");
                return Ok(());
            }
            next = reader.next() => next,
        };

        let Some(line) = line else {
            debug!("stdin closed, stdio transport exiting");
            return Ok(());
        };

        let line = line.map_err(|e| TransportError::Io(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => {
                trace!(method = %request.method, "stdio request");
                let ctx = RequestContext::new();
                handler.handle(request, ctx).await
            }
            Err(e) => {
                warn!(error = %e, "malformed JSON-RPC line on stdin");
                JsonRpcResponse::parse_error(e.to_string())
            }
        };

        let rendered = serde_json::to_string(&response)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        if let Err(e) = writer.send(rendered).await {
            error!(error = %e, "failed writing response to stdout");
            return Err(TransportError::Io(e.to_string()));
        }
    }
}

/// Build an internal-error response for a request that panicked or errored
/// at the handler boundary before it could produce a typed `JsonRpcError`.
#[must_use]
pub fn internal_error_response(id: Option<gpumcp_protocol::RequestId>, detail: &str) -> JsonRpcResponse {
    JsonRpcResponse::error(
        JsonRpcError {
            code: JsonRpcErrorCode::InternalError.code(),
            message: JsonRpcErrorCode::InternalError.message().to_string(),
            data: Some(serde_json::json!({ "detail": detail })),
        },
        id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gpumcp_protocol::RequestId;

    struct EchoHandler;

    #[async_trait]
    impl RequestHandler for EchoHandler {
        async fn handle(&self, request: JsonRpcRequest, _ctx: RequestContext) -> JsonRpcResponse {
            JsonRpcResponse::success(serde_json::json!({ "echo": request.method }), request.id)
        }
    }

    #[test]
    fn internal_error_response_carries_detail() {
        let response = internal_error_response(Some(RequestId::Number(1)), "boom");
        let error = response.error.expect("error response");
        assert_eq!(error.code, JsonRpcErrorCode::InternalError.code());
        assert_eq!(error.data.unwrap()["detail"], "boom");
    }

    #[tokio::test]
    async fn handler_is_object_safe_and_callable() {
        let handler: Arc<dyn RequestHandler> = Arc::new(EchoHandler);
        let request = JsonRpcRequest::without_params("ping", RequestId::Number(1));
        let response = handler.handle(request, RequestContext::new()).await;
        assert!(response.is_success());
    }
}
