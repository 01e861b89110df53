//! Line-delimited JSON-RPC server.
//!
//! Each request runs as its own task so slow tool calls do not block the
//! ones behind them; a single writer task serializes responses to the output.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::dispatcher::{Dispatcher, ToolInvocation, ToolResult};
use crate::error::ToolError;
use crate::registry;

const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Serve on stdin/stdout until stdin closes.
    pub async fn run(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        log::info!("McpServer: listening for requests");

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(write_responses(rx, output));

        let mut reader = BufReader::new(input);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    log::debug!("McpServer: received EOF, shutting down");
                    break;
                }
                Ok(_) => {
                    let request = line.trim().to_string();
                    if request.is_empty() {
                        continue;
                    }
                    log::debug!("McpServer: received {}", request);

                    // Nobody would see the reply, so do not start the call.
                    if tx.is_closed() {
                        log::error!("McpServer: output closed, stopping");
                        break;
                    }

                    let dispatcher = self.dispatcher.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(response) = process_request(&dispatcher, &request).await {
                            match serde_json::to_string(&response) {
                                Ok(json) => {
                                    if tx.send(json).is_err() {
                                        log::warn!("McpServer: output closed, response dropped");
                                    }
                                }
                                Err(e) => log::error!("McpServer: failed to serialize response: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    log::error!("McpServer: failed to read input: {}", e);
                    break;
                }
            }
        }

        // In-flight tasks hold their own senders; the writer drains until they finish.
        drop(tx);
        writer.await?;

        log::info!("McpServer: stopped");
        Ok(())
    }
}

async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<String>, mut output: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(json) = rx.recv().await {
        log::debug!("McpServer: sending {}", json);

        let written = async {
            output.write_all(json.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await
        }
        .await;

        if let Err(e) = written {
            log::error!("McpServer: failed to write response: {}", e);
            break;
        }
    }
}

/// Handle one request line. Returns `None` for notifications.
pub async fn process_request(dispatcher: &Dispatcher, line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
            ));
        }
    };

    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::error(
            request.response_id(),
            JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
        ));
    }

    let Some(id) = request.id.clone() else {
        log::debug!("McpServer: notification {}", request.method);
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(id, initialize_result()),
        "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
        "tools/list" => JsonRpcResponse::success(
            id,
            serde_json::json!({ "tools": registry::tool_descriptors() }),
        ),
        "tools/call" => handle_tools_call(dispatcher, id, request.params).await,
        method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
    };

    Some(response)
}

fn initialize_result() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {}
        }
    })
}

async fn handle_tools_call(
    dispatcher: &Dispatcher,
    id: Option<Value>,
    params: Value,
) -> JsonRpcResponse {
    let Value::Object(mut params) = params else {
        return JsonRpcResponse::error(id, JsonRpcError::invalid_params("params must be an object"));
    };

    let name = match params.remove("name") {
        Some(Value::String(name)) => name,
        _ => {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("missing 'name' field"));
        }
    };

    let result = match params.remove("arguments") {
        None | Some(Value::Null) => {
            dispatcher
                .dispatch(ToolInvocation {
                    name,
                    arguments: Default::default(),
                })
                .await
        }
        Some(Value::Object(arguments)) => {
            dispatcher.dispatch(ToolInvocation { name, arguments }).await
        }
        Some(_) => ToolResult::error(&ToolError::InvalidArguments {
            tool: name,
            reason: "arguments must be an object".to_string(),
        }),
    };

    match serde_json::to_value(&result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            JsonRpcError::internal_error(format!("Serialization error: {}", e)),
        ),
    }
}
