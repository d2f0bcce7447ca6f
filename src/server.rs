//! JSON-RPC 2.0 server over newline-delimited streams.
//!
//! One line is read, fully handled and answered before the next is read, so
//! responses always come out in request order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::convert::error_result;
use crate::error::{McpError, Result};
use crate::resources;
use crate::session::DocumentSession;
use crate::tools::ToolRegistry;

/// A JSON-RPC request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0"
    pub jsonrpc: String,
    /// Correlation id; `None` only when the member is absent (a notification)
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<JsonValue>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<JsonValue>,
}

// An explicit `"id": null` is still a request and must be answered.
fn present_id<'de, D>(deserializer: D) -> std::result::Result<Option<JsonValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    /// Whether the sender expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Echo of the request id
    pub id: JsonValue,
    /// Success payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Failure payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// A success response.
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// An error response carrying the error's JSON-RPC code.
    pub fn failure(id: JsonValue, err: &McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code(),
                message: err.to_string(),
            }),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
}

/// Lifecycle of a server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for `initialize`
    Uninitialized,
    /// Serving requests
    Ready,
    /// Input is no longer read
    Closed,
}

/// Server identity and lifecycle policy.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Reported in `serverInfo.name`
    pub name: String,
    /// Reported in `serverInfo.version`
    pub version: String,
    /// Reported as `protocolVersion`
    pub protocol_version: String,
    /// Reject everything but `initialize`/`ping` until initialized
    pub strict_lifecycle: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "docstore-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: "2024-11-05".to_string(),
            strict_lifecycle: false,
        }
    }
}

/// Every method the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `initialize`
    Initialize,
    /// `notifications/initialized`
    Initialized,
    /// `ping`
    Ping,
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall,
    /// `resources/list`
    ResourcesList,
    /// `resources/read`
    ResourcesRead,
}

type Handler = fn(&mut McpServer, Option<JsonValue>) -> Result<JsonValue>;

impl Method {
    /// Every method, for building the dispatch table.
    pub const ALL: [Method; 7] = [
        Method::Initialize,
        Method::Initialized,
        Method::Ping,
        Method::ToolsList,
        Method::ToolsCall,
        Method::ResourcesList,
        Method::ResourcesRead,
    ];

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Method::Initialize => "initialize",
            Method::Initialized => "notifications/initialized",
            Method::Ping => "ping",
            Method::ToolsList => "tools/list",
            Method::ToolsCall => "tools/call",
            Method::ResourcesList => "resources/list",
            Method::ResourcesRead => "resources/read",
        }
    }

    /// Whether strict lifecycle mode lets this through before `initialize`.
    fn allowed_before_initialize(&self) -> bool {
        matches!(
            self,
            Method::Initialize | Method::Initialized | Method::Ping
        )
    }

    fn handler(&self) -> Handler {
        match self {
            Method::Initialize => McpServer::handle_initialize,
            Method::Initialized => McpServer::handle_initialized,
            Method::Ping => McpServer::handle_ping,
            Method::ToolsList => McpServer::handle_tools_list,
            Method::ToolsCall => McpServer::handle_tools_call,
            Method::ResourcesList => McpServer::handle_resources_list,
            Method::ResourcesRead => McpServer::handle_resources_read,
        }
    }
}

/// Method name to handler mapping, verified when built.
pub struct MethodTable {
    entries: HashMap<&'static str, (Method, Handler)>,
}

impl MethodTable {
    /// Build the table, failing if two methods share a wire name.
    pub fn new() -> Result<Self> {
        let mut entries = HashMap::new();
        for method in Method::ALL {
            if entries
                .insert(method.name(), (method, method.handler()))
                .is_some()
            {
                return Err(McpError::Internal(format!(
                    "method '{}' registered twice",
                    method.name()
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Resolve a wire name.
    pub fn lookup(&self, name: &str) -> Option<(Method, Handler)> {
        self.entries.get(name).copied()
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// MCP server answering document queries.
pub struct McpServer {
    session: DocumentSession,
    registry: ToolRegistry,
    methods: MethodTable,
    config: ServerConfig,
    state: ServerState,
}

impl McpServer {
    /// Create a server with the default configuration.
    pub fn new(session: DocumentSession) -> Result<Self> {
        Self::with_config(session, ServerConfig::default())
    }

    /// Create a server with an explicit configuration.
    pub fn with_config(session: DocumentSession, config: ServerConfig) -> Result<Self> {
        Ok(Self {
            session,
            registry: ToolRegistry::new(),
            methods: MethodTable::new()?,
            config,
            state: ServerState::Uninitialized,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// The session being served.
    pub fn session(&self) -> &DocumentSession {
        &self.session
    }

    /// Stop accepting input.
    pub fn close(&mut self) {
        if self.state != ServerState::Closed {
            info!("Server closed");
        }
        self.state = ServerState::Closed;
    }

    /// Serve stdin/stdout until EOF or `shutdown` resolves.
    pub async fn run<S>(&mut self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout, shutdown).await
    }

    /// Serve a line stream until EOF or `shutdown` resolves.
    pub async fn serve<R, W, S>(&mut self, reader: R, mut writer: W, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = reader.split(b'\n');
        tokio::pin!(shutdown);

        while self.state != ServerState::Closed {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                line = lines.next_segment() => {
                    let Some(bytes) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    if let Some(response) = self.handle_bytes(&bytes) {
                        let mut frame = serde_json::to_string(&response)?;
                        frame.push('\n');
                        writer.write_all(frame.as_bytes()).await?;
                        writer.flush().await?;
                    }
                }
            }
        }

        self.close();
        Ok(())
    }

    /// Handle one raw input line; lines that are not UTF-8 are dropped.
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        match std::str::from_utf8(bytes) {
            Ok(line) => self.handle_line(line),
            Err(e) => {
                warn!(error = %e, "Dropping malformed line");
                None
            }
        }
    }

    /// Handle one input line; `None` means nothing is written back.
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        if self.state == ServerState::Closed || line.trim().is_empty() {
            return None;
        }

        let value: JsonValue = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Dropping malformed line");
                return None;
            }
        };

        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "Line is not a JSON-RPC request");
                let err = McpError::InvalidRequest(e.to_string());
                return id.map(|id| JsonRpcResponse::failure(id, &err));
            }
        };

        self.handle_request(request)
    }

    /// Dispatch a parsed request; notifications get no response.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "Handling request");

        let outcome = if request.jsonrpc != "2.0" {
            Err(McpError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            )))
        } else {
            self.dispatch(&request.method, request.params)
        };

        let id = match request.id {
            Some(id) => id,
            None => {
                if let Err(e) = outcome {
                    debug!(error = %e, "Notification failed");
                }
                return None;
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                debug!(code = e.code(), error = %e, "Request failed");
                JsonRpcResponse::failure(id, &e)
            }
        })
    }

    fn dispatch(&mut self, method: &str, params: Option<JsonValue>) -> Result<JsonValue> {
        let (method, handler) = self
            .methods
            .lookup(method)
            .ok_or_else(|| McpError::MethodNotFound(method.to_string()))?;

        if self.config.strict_lifecycle
            && self.state == ServerState::Uninitialized
            && !method.allowed_before_initialize()
        {
            return Err(McpError::NotInitialized);
        }

        handler(self, params)
    }

    // ── Handlers ─────────────────────────────────────────────────────────

    fn handle_initialize(&mut self, _params: Option<JsonValue>) -> Result<JsonValue> {
        if self.state == ServerState::Uninitialized {
            info!("Client initialized");
            self.state = ServerState::Ready;
        }
        Ok(serde_json::json!({
            "protocolVersion": self.config.protocol_version,
            "serverInfo": {
                "name": self.config.name,
                "version": self.config.version,
            },
            "capabilities": {
                "tools": {},
                "resources": {},
            },
        }))
    }

    fn handle_initialized(&mut self, _params: Option<JsonValue>) -> Result<JsonValue> {
        Ok(JsonValue::Null)
    }

    fn handle_ping(&mut self, _params: Option<JsonValue>) -> Result<JsonValue> {
        Ok(serde_json::json!({}))
    }

    fn handle_tools_list(&mut self, _params: Option<JsonValue>) -> Result<JsonValue> {
        Ok(serde_json::json!({ "tools": self.registry.tools() }))
    }

    fn handle_tools_call(&mut self, params: Option<JsonValue>) -> Result<JsonValue> {
        let params = object_params(params)?;
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::InvalidParams("missing tool name".to_string()))?;
        let args = match params.get("arguments") {
            None | Some(JsonValue::Null) => Map::new(),
            Some(JsonValue::Object(args)) => args.clone(),
            Some(_) => {
                return Err(McpError::InvalidParams(
                    "arguments must be an object".to_string(),
                ))
            }
        };

        info!(tool = %name, "Calling tool");
        match self.registry.dispatch(&self.session, name, args) {
            Err(e) if e.is_tool_result() => Ok(error_result(&e.to_string())),
            other => other,
        }
    }

    fn handle_resources_list(&mut self, _params: Option<JsonValue>) -> Result<JsonValue> {
        Ok(serde_json::json!({ "resources": resources::resources() }))
    }

    fn handle_resources_read(&mut self, params: Option<JsonValue>) -> Result<JsonValue> {
        let params = object_params(params)?;
        let uri = params
            .get("uri")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::InvalidParams("missing resource uri".to_string()))?;
        resources::read(&self.session, uri)
    }
}

fn object_params(params: Option<JsonValue>) -> Result<Map<String, JsonValue>> {
    match params {
        Some(JsonValue::Object(map)) => Ok(map),
        None | Some(JsonValue::Null) => Ok(Map::new()),
        Some(_) => Err(McpError::InvalidParams(
            "params must be an object".to_string(),
        )),
    }
}
