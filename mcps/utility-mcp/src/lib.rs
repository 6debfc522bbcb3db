//! Utility MCP Library
//!
//! Trivial tools for exercising an MCP client: echo a message, add two
//! numbers, and read the current time.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use utility_mcp::{EmbeddableMcp, UtilityMcpServer};
//!
//! let server = UtilityMcpServer::new();
//! let result = server.dispatch("echo", serde_json::json!({"message": "hi"})).await;
//! ```
//!
//! # Usage as Binary
//!
//! Configure in `.mcp.json`:
//! ```json
//! { "mcpServers": { "utility": { "command": "./utility-mcp" } } }
//! ```

pub mod server;

// Re-export main server type
pub use server::UtilityMcpServer;

// Re-export parameter types for direct API usage
pub use server::{AddParams, EchoParams, TimeParams};

// Re-export EmbeddableMcp trait for in-process usage
pub use mcp_common::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
