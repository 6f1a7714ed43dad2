use crate::app::App;
use crate::constants::protocol::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::{tool_catalog, validate_tool_args};
use crate::mcp::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::services::notifications::{Notification, NotificationSink, SinkResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Pushes `notifications/message` frames into the outbound writer queue.
#[derive(Clone)]
pub struct McpNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl McpNotifier {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl NotificationSink for McpNotifier {
    async fn send(&self, notification: Notification) -> SinkResult {
        let frame = JsonRpcNotification::new("notifications/message", notification);
        let payload = serde_json::to_string(&frame)?;
        self.tx.send(payload)?;
        Ok(())
    }
}

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false }, "logging": {} },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": tool_catalog() })
    }

    pub async fn handle_tools_call(
        &self,
        name: &str,
        raw_args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<Value, McpError> {
        let args = if raw_args.is_null() {
            Value::Object(Default::default())
        } else {
            raw_args
        };
        validate_tool_args(name, &args)?;

        let result = self
            .app
            .tool_executor
            .execute(name, args, sink)
            .await
            .map_err(McpError::from)?;
        serde_json::to_value(result)
            .map_err(|err| McpError::new(ErrorCode::InternalError, err.to_string()))
    }

    /// Handles one inbound line. `None` means nothing is written back.
    pub async fn handle_line(
        &self,
        line: &str,
        sink: &dyn NotificationSink,
    ) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError,
                    "Parse error",
                ))
            }
        };
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(request) => request,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest,
                    "Invalid request",
                ))
            }
        };

        if request.method.starts_with("notifications/") {
            return None;
        }
        let id = request.id.clone()?;

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => match request.param_str("name").filter(|n| !n.is_empty()) {
                Some(name) => {
                    let args = request
                        .params
                        .get("arguments")
                        .cloned()
                        .unwrap_or(Value::Null);
                    self.handle_tools_call(name, args, sink).await
                }
                None => Err(McpError::new(ErrorCode::InvalidParams, "Missing tool name")),
            },
            other => Err(McpError::new(
                ErrorCode::MethodNotFound,
                format!("Method not found: {}", other),
            )),
        };
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::from_error(id, err),
        })
    }

    /// Line-delimited JSON-RPC loop. Requests run concurrently; a single
    /// writer task serializes responses and notifications onto `output`.
    pub async fn serve<R, W>(self: Arc<Self>, input: R, output: W) -> Result<(), ToolError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            let mut writer = BufWriter::new(output);
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let mut lines = BufReader::new(input).lines();
        let mut in_flight = JoinSet::new();
        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                continue;
            }
            let server = self.clone();
            let tx = tx.clone();
            in_flight.spawn(async move {
                let notifier = McpNotifier::new(tx.clone());
                if let Some(response) = server.handle_line(&trimmed, &notifier).await {
                    let payload = serde_json::to_string(&response).unwrap_or_default();
                    let _ = tx.send(payload);
                }
            });
            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        drop(tx);
        writer
            .await
            .map_err(|err| ToolError::internal(err.to_string()))??;
        Ok(())
    }
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let app = App::initialize()?;
    app.logger.info(
        "Server ready on stdio",
        Some(&serde_json::json!({ "version": SERVER_VERSION })),
    );
    let logger = app.logger.clone();
    let server = Arc::new(McpServer::new(app));
    let outcome = server.serve(tokio::io::stdin(), tokio::io::stdout()).await;
    logger.info("Input closed, shutting down", Some(&logger.stats()));
    outcome
}
