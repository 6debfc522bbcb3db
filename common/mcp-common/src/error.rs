//! Error handling utilities for MCP servers
//!
//! Protocol-level errors (`McpError`) are reserved for failures of the
//! server itself, such as a response that cannot be serialized. Tool-level
//! failures are returned as error-flagged results; see [`crate::text_error`].

use rmcp::ErrorData as McpError;

/// Type alias for MCP tool results
pub type McpResult<T> = Result<T, McpError>;

/// Trait for converting errors into MCP-compatible errors
///
/// Implement this for external error types to use `?` inside tool bodies
/// via [`ResultExt::to_mcp_err`].
pub trait IntoMcpError {
    /// Convert this error into an MCP error
    fn into_mcp_error(self) -> McpError;
}

impl IntoMcpError for serde_json::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("JSON error: {}", self), None)
    }
}

impl IntoMcpError for anyhow::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(self.to_string(), None)
    }
}

impl IntoMcpError for String {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(self, None)
    }
}

/// Extension trait for Result types to convert to MCP errors
///
/// ```rust,ignore
/// use mcp_common::ResultExt;
///
/// let json = serde_json::to_string_pretty(&rows).to_mcp_err()?;
/// ```
pub trait ResultExt<T> {
    /// Convert the error to an MCP error
    fn to_mcp_err(self) -> Result<T, McpError>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> Result<T, McpError> {
        self.map_err(|e| e.into_mcp_error())
    }
}
