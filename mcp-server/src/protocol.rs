//! MCP JSON-RPC 2.0 messages and method routing.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dispatch::{ToolDispatcher, ToolResult};
use crate::tools::ToolDescriptor;

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "veridictum";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    /// `None` only when the member is absent. An explicit `null` id is kept.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl McpRequest {
    /// Requests without an id are notifications and never get a response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    pub fn result(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP Tools List Response
#[derive(Debug, Serialize)]
struct ToolsListResult {
    tools: Vec<ToolDescriptor>,
}

/// MCP Tool Call Response
#[derive(Debug, Serialize)]
struct ToolCallResult {
    content: Vec<Value>,
    #[serde(rename = "isError")]
    is_error: bool,
}

impl From<ToolResult> for ToolCallResult {
    fn from(result: ToolResult) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": result.text })],
            is_error: result.is_error,
        }
    }
}

pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Handle one raw frame. Returns the response to send back, if any.
    pub async fn handle_raw(&self, raw: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[MCP] Unparseable message: {}", e);
                return Some(McpResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<McpRequest>(value) {
            Ok(req) => self.handle(req).await,
            Err(e) => Some(McpResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        }
    }

    pub async fn handle(&self, req: McpRequest) -> Option<McpResponse> {
        tracing::info!("[MCP] Received request: method={}, id={:?}", req.method, req.id);

        if req.is_notification() {
            return None;
        }

        if req.jsonrpc != "2.0" {
            return Some(McpResponse::error(
                req.id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version {:?}", req.jsonrpc),
            ));
        }

        let response = match req.method.as_str() {
            "initialize" => McpResponse::result(req.id, self.initialize(req.params.as_ref())),
            "ping" => McpResponse::result(req.id, json!({})),
            "tools/list" => {
                let result = ToolsListResult {
                    tools: self.dispatcher.list_tools(),
                };
                to_response(req.id, &result)
            }
            "tools/call" => self.call_tool(req.id, req.params).await,
            other => McpResponse::error(
                req.id,
                METHOD_NOT_FOUND,
                format!("Method '{other}' not found"),
            ),
        };
        Some(response)
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        let instructions = if self.dispatcher.config().setup_enabled() {
            "Veridictum verifies legal citations against a database of real court cases. \
             If a tool reports that no API key is configured, use setup_api_key."
        } else {
            "Veridictum verifies legal citations against a database of real court cases. \
             The API key is read from VERIDICTUM_API_KEY."
        };

        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": instructions
        })
    }

    async fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> McpResponse {
        let Some(params) = params else {
            return McpResponse::error(id, INVALID_PARAMS, "Invalid params");
        };

        let Some(name) = params.get("name").and_then(|n| n.as_str()) else {
            return McpResponse::error(id, INVALID_PARAMS, "Tool name required");
        };

        let result = self
            .dispatcher
            .call_tool(name, params.get("arguments").cloned())
            .await;
        to_response(id, &ToolCallResult::from(result))
    }
}

fn to_response<T: Serialize>(id: Option<Value>, result: &T) -> McpResponse {
    match serde_json::to_value(result) {
        Ok(value) => McpResponse::result(id, value),
        Err(e) => McpResponse::error(id, INTERNAL_ERROR, format!("Internal error: {e}")),
    }
}
