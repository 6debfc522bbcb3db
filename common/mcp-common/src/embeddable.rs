//! Embeddable MCP trait for in-process execution
//!
//! [`EmbeddableMcp`] lets a server's tools be listed and called directly,
//! without a transport. It is also the dispatch path used by the protocol
//! handler (see [`crate::embeddable_server_handler!`]): [`EmbeddableMcp::dispatch`]
//! resolves the tool, validates arguments against its schema and turns every
//! failure into an error-flagged result.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//! use utility_mcp::UtilityMcpServer;
//!
//! let server = UtilityMcpServer::new();
//! let tools = server.list_tools();
//! let result = server.dispatch("add", serde_json::json!({"a": 2, "b": 3})).await;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

use crate::result::text_error;
use crate::validate::{validate_arguments, ValidationError};

/// Error type for embeddable MCP operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    /// Tool was not found in the server
    #[error("unknown tool: {0}")]
    ToolNotFound(String),

    /// Arguments did not match the tool's schema or value constraints
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] ValidationError),

    /// Arguments could not be deserialized into the tool's parameter type
    #[error("invalid parameters: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// MCP protocol error
    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

/// Result type for embeddable MCP operations
pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// Trait for MCP servers that can be executed in-process
///
/// Implementations must be `Send + Sync` to support concurrent tool calls.
/// Servers built with `#[tool_router]` list tools through their router and
/// match on the tool name in `call_tool`:
///
/// ```rust,ignore
/// #[async_trait]
/// impl EmbeddableMcp for MyServer {
///     fn server_name(&self) -> &str {
///         "my-server"
///     }
///
///     fn list_tools(&self) -> Vec<Tool> {
///         self.tool_router.list_all()
///     }
///
///     async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
///         match name {
///             "echo" => {
///                 let params: EchoParams = serde_json::from_value(params)?;
///                 self.echo(Parameters(params)).await.map_err(Into::into)
///             }
///             _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Returns the server name for identification
    fn server_name(&self) -> &str;

    /// Returns a list of all available tools
    fn list_tools(&self) -> Vec<Tool>;

    /// Executes a tool by name with the given parameters
    ///
    /// Fails if the tool is unknown, the parameters cannot be deserialized,
    /// or the tool returns a protocol error. Callers that need a response
    /// in every case should use [`EmbeddableMcp::dispatch`].
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    /// Returns an optional description of the server
    fn server_description(&self) -> Option<&str> {
        None
    }

    /// Returns the server version, if available
    fn server_version(&self) -> Option<&str> {
        None
    }

    /// Resolve, validate and execute a tool call
    ///
    /// Never fails: unknown tools, invalid arguments and tool errors all
    /// come back as error-flagged results.
    async fn dispatch(&self, name: &str, params: Value) -> CallToolResult {
        let Some(tool) = self.list_tools().into_iter().find(|t| t.name == name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return text_error(EmbeddableError::ToolNotFound(name.to_string()).to_string());
        };

        if let Err(e) = validate_arguments(&tool.input_schema, &params) {
            tracing::warn!(tool = name, error = %e, "rejected tool arguments");
            return text_error(EmbeddableError::from(e).to_string());
        }

        let params = match params {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };

        match self.call_tool(name, params).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                text_error(e.to_string())
            }
        }
    }
}
