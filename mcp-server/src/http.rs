//! HTTP transport for hosts that cannot spawn a stdio subprocess.
//!
//! - GET  /health - liveness
//! - GET  /tools  - tool descriptors
//! - POST /mcp    - one JSON-RPC message per request

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::protocol::McpServer;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8001";

pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/mcp", post(handle_mcp))
        .layer(CorsLayer::permissive())
        .with_state(server)
}

pub async fn run(server: Arc<McpServer>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[HTTP] Listening on http://{}", addr);
    tracing::info!("[HTTP]   GET  /tools   - List all tools");
    tracing::info!("[HTTP]   POST /mcp     - MCP protocol endpoint");
    axum::serve(listener, router(server)).await?;
    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// List all available tools
async fn list_tools(State(server): State<Arc<McpServer>>) -> Json<Value> {
    tracing::info!("[LIST TOOLS] Received request to list available tools");
    Json(json!({ "tools": server.dispatcher().list_tools() }))
}

/// Handle MCP protocol requests. Notifications are acknowledged with 202.
async fn handle_mcp(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_raw(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
