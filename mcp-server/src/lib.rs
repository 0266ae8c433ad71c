//! Veridictum MCP server library.
//! Exposes the Veridictum citation verification API as MCP tools.

pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod http;
pub mod protocol;
pub mod stdio;
pub mod tools;

pub use config::{CredentialMode, ServerConfig};
pub use credentials::CredentialResolver;
pub use dispatch::{ToolDispatcher, ToolResult};
pub use protocol::{McpRequest, McpResponse, McpServer};
pub use tools::{ToolDescriptor, ToolKind};
