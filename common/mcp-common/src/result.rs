//! Result helpers for MCP tool responses
//!
//! Tools report their own failures as error-flagged results rather than
//! protocol errors, so the request/response exchange always completes and
//! only the payload carries the failure.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::{McpResult, ResultExt};

/// Create a successful JSON response from any serializable data
///
/// Replaces the common pattern:
/// ```rust,ignore
/// let json = serde_json::to_string_pretty(&data)
///     .map_err(|e| McpError::internal_error(e.to_string(), None))?;
/// Ok(CallToolResult::success(vec![Content::text(json)]))
/// ```
///
/// # Returns
///
/// * `Ok(CallToolResult)` with pretty-printed JSON content
/// * `Err(McpError)` if serialization fails
pub fn json_success<T: Serialize>(data: &T) -> McpResult<CallToolResult> {
    let json = serde_json::to_string_pretty(data).to_mcp_err()?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Create a successful plain text response
///
/// ```rust,ignore
/// use mcp_common::text_success;
///
/// fn my_tool(&self) -> Result<CallToolResult, McpError> {
///     Ok(text_success("Operation completed successfully"))
/// }
/// ```
pub fn text_success(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Create an error-flagged plain text response
///
/// Use this for tool-level failures (bad input, rejected queries, driver
/// errors). The client sees `is_error: true` with the message as content.
///
/// ```rust,ignore
/// use mcp_common::text_error;
///
/// if params.path.is_empty() {
///     return Ok(text_error("path cannot be empty"));
/// }
/// ```
pub fn text_error(text: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(text.into())])
}

/// Concatenate the text content of a result
///
/// Non-text content items are skipped.
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            rmcp::model::RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether the result is flagged as a tool-level error
pub fn is_error(result: &CallToolResult) -> bool {
    result.is_error.unwrap_or(false)
}
