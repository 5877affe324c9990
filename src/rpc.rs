//! JSON-RPC 2.0 framing over the tool registry, and the stdio transport

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::tools::{ErrorBody, ToolError, ToolRegistry};

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl RpcResponse {
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(id: Value, error: &ToolError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error.body()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Routes JSON-RPC methods to the tool registry
#[derive(Clone)]
pub struct RpcHandler {
    registry: Arc<ToolRegistry>,
}

impl RpcHandler {
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        match method {
            "tools/list" | "list_tools" => Ok(json!({ "tools": self.registry.list_tools() })),
            "tools/call" => {
                let params: CallParams = serde_json::from_value(params)
                    .map_err(|e| ToolError::InvalidParams(format!("tools/call: {e}")))?;
                let response = self.registry.dispatch(&params.name, params.arguments).await?;
                serde_json::to_value(response).map_err(|e| ToolError::InternalError(e.to_string()))
            }
            tool => {
                let response = self.registry.dispatch(tool, params).await?;
                serde_json::to_value(response).map_err(|e| ToolError::InternalError(e.to_string()))
            }
        }
    }

    /// Answer one request. Notifications (no id) produce no response.
    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        let params = request.params.unwrap_or(Value::Null);
        let outcome = self.call(&request.method, params).await;
        let id = request.id?;
        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(e) => RpcResponse::failure(id, &e),
        })
    }

    /// Answer one line of newline-delimited JSON-RPC
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle(request).await?,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable JSON-RPC request");
                RpcResponse::failure(
                    Value::Null,
                    &ToolError::InvalidParams(format!("parse error: {e}")),
                )
            }
        };
        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode JSON-RPC response");
                None
            }
        }
    }
}

/// Serve newline-delimited JSON-RPC from `input` to `output` until EOF.
///
/// Each request runs as its own task, so responses are written in completion
/// order, one whole line at a time. Returns once every request has been answered.
pub async fn serve_lines<R, W>(handler: &RpcHandler, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (responses, mut outbox) = mpsc::unbounded_channel::<String>();

    let read = async move {
        let mut lines = BufReader::new(input).lines();
        let mut in_flight = JoinSet::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let handler = handler.clone();
            let responses = responses.clone();
            in_flight.spawn(async move {
                let Some(response) = handler.handle_line(&line).await else {
                    return;
                };
                if responses.send(response).is_err() {
                    tracing::debug!("Output closed, dropping response");
                }
            });
        }
        drop(responses);
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "JSON-RPC request task failed");
            }
        }
        Ok::<_, std::io::Error>(())
    };

    let write = async {
        while let Some(response) = outbox.recv().await {
            output.write_all(response.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    };

    tokio::try_join!(read, write)?;
    Ok(())
}

/// Serve JSON-RPC on stdin/stdout
pub async fn serve_stdio(handler: RpcHandler) -> std::io::Result<()> {
    tracing::info!("Serving JSON-RPC on stdio");
    serve_lines(&handler, tokio::io::stdin(), tokio::io::stdout()).await
}
