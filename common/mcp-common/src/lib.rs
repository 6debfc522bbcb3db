//! MCP Common - Shared utilities for MCP servers
//!
//! This crate provides common functionality used across all MCP servers:
//!
//! - **Initialization**: `serve_stdio!` macro for standardized server startup
//! - **Results**: `text_success`, `text_error` and `json_success` helpers
//! - **Errors**: Traits for converting errors to MCP-compatible format
//! - **Validation**: checking invocation arguments against a tool's schema
//! - **Embeddable**: [`EmbeddableMcp`] trait for in-process execution and
//!   the dispatch path behind `embeddable_server_handler!`
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::{serve_stdio, embeddable_server_handler};
//!
//! // In server.rs
//! embeddable_server_handler!(MyServer, "What this server does.");
//!
//! // In main.rs
//! serve_stdio!(MyServer, "my_mcp");
//! ```

pub mod embeddable;
pub mod error;
pub mod handler;
pub mod init;
pub mod result;
pub mod validate;

// Re-export commonly used items at crate root
pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::{IntoMcpError, McpResult, ResultExt};
pub use init::init_tracing;
pub use result::{is_error, json_success, result_text, text_error, text_success};
pub use validate::{validate_arguments, ValidationError};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

// Re-export async_trait for implementing EmbeddableMcp
pub use async_trait::async_trait;
