//! Veridictum MCP server - legal citation verification tools.
//!
//! - `veridictum-mcp`: stdio transport (spawned by the assistant host)
//! - `veridictum-mcp --http [ADDR]`: HTTP transport at /mcp
//!
//! Configuration comes from the environment (optionally a `.env` file); see `config.rs`.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use veridictum_mcp::config::{CredentialMode, ServerConfig};
use veridictum_mcp::http::DEFAULT_HTTP_ADDR;
use veridictum_mcp::{http, stdio, McpServer, ToolDispatcher};

#[derive(Parser)]
#[command(name = "veridictum-mcp")]
#[command(about = "Veridictum citation verification MCP server")]
struct Args {
    /// Serve HTTP instead of stdio. Optional bind address.
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_HTTP_ADDR)]
    http: Option<String>,

    /// Read the API key from VERIDICTUM_API_KEY only and hide the setup tool.
    #[arg(long)]
    env_only: bool,

    /// Credential file path (default ~/.veridictum/config.json).
    #[arg(long)]
    config_file: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = ServerConfig::from_env();
    if args.env_only {
        config = config.with_mode(CredentialMode::EnvOnly);
    }
    if let Some(path) = args.config_file {
        config = config.with_config_file(path);
    }

    tracing::info!("[INIT] API endpoint: {}", config.api_url);
    match config.mode {
        CredentialMode::EnvOnly => tracing::info!("[INIT] Credential mode: environment only"),
        CredentialMode::ConfigFile => tracing::info!(
            "[INIT] Credential mode: environment, then {}",
            config.config_file.display()
        ),
    }
    if config.env_api_key.is_none() {
        tracing::info!("[INIT] VERIDICTUM_API_KEY not set");
    }

    let server = McpServer::new(ToolDispatcher::new(config));

    match args.http {
        Some(addr) => http::run(Arc::new(server), &addr).await,
        None => stdio::run(&server).await,
    }
}
