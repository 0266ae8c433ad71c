//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! One request is handled at a time. Logging goes to stderr, never here.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{McpResponse, McpServer, PARSE_ERROR};

/// Serve until the reader reaches EOF. A frame that is not valid UTF-8 gets a
/// parse error and the loop carries on.
pub async fn serve<R, W>(server: &McpServer, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buffer) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                server.handle_raw(line).await
            }
            Err(e) => {
                tracing::warn!("[STDIO] Frame is not valid UTF-8: {}", e);
                Some(McpResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")))
            }
        };

        if let Some(response) = response {
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
    }

    tracing::info!("[STDIO] Input closed, shutting down");
    Ok(())
}

pub async fn run(server: &McpServer) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(server, stdin, stdout).await
}
