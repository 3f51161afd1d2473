//! MCP server: newline-delimited JSON-RPC over stdio.
//!
//! The read loop handles requests in receive order and writes every
//! response from a single point, so responses never interleave on the
//! wire. stdout carries only JSON-RPC responses; all diagnostics go
//! through `tracing` to stderr or a log file.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::protocol::{self, Incoming, RequestId, Response, RpcError};
use crate::tools::{self, ToolResult};

const SERVER_NAME: &str = "roo-modes-server";
const SERVER_VERSION: &str = "0.1.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Reject lines longer than this (4 MiB) with a parse error.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Bridge between the protocol layer and the mode/task core.
#[async_trait::async_trait]
pub trait ModeServerHandler: Send + Sync {
    /// Execute one of the MCP tools.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, RpcError>;

    /// Descriptors for `resources/list`.
    fn list_resources(&self) -> Result<Value, RpcError>;

    /// Contents for `resources/read`.
    fn read_resource(&self, uri: &str) -> Result<Value, RpcError>;

    fn mode_count(&self) -> usize;

    fn session_count(&self) -> usize;

    /// Called once on graceful shutdown (EOF on stdin).
    fn shutdown(&self) {}
}

/// MCP server over stdio.
pub struct McpServer<H: ModeServerHandler> {
    handler: H,
    initialized: bool,
    client_info: Option<Value>,
}

impl<H: ModeServerHandler> McpServer<H> {
    pub fn new(handler: H) -> Self {
        McpServer {
            handler,
            initialized: false,
            client_info: None,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Run the server until EOF on stdin.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!(
            modes = self.handler.mode_count(),
            "MCP server started, waiting for messages"
        );

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);

        let mut line = String::new();
        loop {
            line.clear();
            let response = match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF received, shutting down");
                    break;
                }
                Ok(_) if line.len() > MAX_LINE_BYTES => {
                    warn!(bytes = line.len(), "Oversize line rejected");
                    Some(Response::from_error(
                        RequestId::Null,
                        RpcError::ParseError(Some("line exceeds maximum length".to_string())),
                    ))
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    debug!(len = trimmed.len(), "Received line");
                    self.handle_message(trimmed).await
                }
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    warn!("Invalid UTF-8 on input");
                    Some(Response::from_error(
                        RequestId::Null,
                        RpcError::ParseError(Some("invalid UTF-8".to_string())),
                    ))
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(response) = response {
                let encoded = protocol::serialize_response(&response)?;
                stdout.write_all(encoded.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        self.handler.shutdown();
        Ok(())
    }

    /// Handle one line of input. Requests produce exactly one response;
    /// notifications produce none.
    pub async fn handle_message(&mut self, message: &str) -> Option<Response> {
        match protocol::parse_incoming(message) {
            Ok(Incoming::Request { id, method, params }) => {
                Some(self.handle_request(id, &method, params).await)
            }
            Ok(Incoming::Notification { method, params }) => {
                self.handle_notification(&method, params);
                None
            }
            Err(err) => Some(Response::from_error(RequestId::Null, err)),
        }
    }

    async fn handle_request(&mut self, id: RequestId, method: &str, params: Value) -> Response {
        let result = match method {
            "initialize" => self.handle_initialize(params),
            "ping" => Ok(json!({})),
            "resources/list" => self.handler.list_resources(),
            "resources/read" => match params.get("uri").and_then(|v| v.as_str()) {
                Some(uri) => self.handler.read_resource(uri),
                None => Err(RpcError::InvalidParams(
                    "missing required parameter: uri".to_string(),
                )),
            },
            "tools/list" => Ok(json!({ "tools": tools::all_tools() })),
            "tools/call" => self.handle_tools_call(params).await,
            other => {
                warn!(method = %other, "Unknown method");
                Err(RpcError::MethodNotFound(other.to_string()))
            }
        };

        match result {
            Ok(value) => Response::success(id, value),
            Err(err) => Response::from_error(id, err),
        }
    }

    fn handle_notification(&mut self, method: &str, params: Value) {
        match method {
            "notifications/initialized" => {
                info!("Client initialization complete");
            }
            "cancelled" => {
                // No cancellation primitive: requests are cheap and
                // non-cancellable, so this is informational only.
                let request_id = params.get("requestId").cloned().unwrap_or(Value::Null);
                info!(request_id = %request_id, "Cancellation notification received");
            }
            other => {
                debug!(method = %other, "Ignoring unknown notification");
            }
        }
    }

    fn handle_initialize(&mut self, params: Value) -> Result<Value, RpcError> {
        let client_info = params.get("clientInfo").cloned();
        let client_name = client_info
            .as_ref()
            .and_then(|info| info.get("name"))
            .and_then(|name| name.as_str())
            .unwrap_or("unknown")
            .to_string();
        let protocol_version = params
            .get("protocolVersion")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        info!(client = %client_name, protocol = %protocol_version, "Initialize request");

        self.client_info = client_info;
        self.initialized = true;

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            },
            "capabilities": {
                "resources": { "listChanged": false },
                "tools": { "listChanged": false },
            }
        }))
    }

    async fn handle_tools_call(&mut self, params: Value) -> Result<Value, RpcError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RpcError::InvalidParams("missing required parameter: name".to_string()))?
            .to_string();
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        let result = self.handler.call_tool(&name, arguments).await?;
        serde_json::to_value(result).map_err(|e| RpcError::InternalError(e.to_string()))
    }

    /// Diagnostic summary, logged at startup and on demand.
    pub fn server_info(&self) -> Value {
        json!({
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "initialized": self.initialized,
            "modes_available": self.handler.mode_count(),
            "active_sessions": self.handler.session_count(),
        })
    }
}
