//! MCP Server implementation for the utility tools

use chrono::{Local, SecondsFormat, Utc};
use mcp_common::{
    async_trait, text_error, text_success, EmbeddableError, EmbeddableMcp, EmbeddableResult,
    McpResult,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Tool},
    tool, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const INSTRUCTIONS: &str = "Utility MCP server. Use echo to repeat a message, \
    add to sum two numbers, and get_time to read the current time.";

/// The Utility MCP Server
#[derive(Clone)]
pub struct UtilityMcpServer {
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for the echo tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EchoParams {
    #[schemars(description = "Message to echo back")]
    pub message: String,
}

/// Parameters for the add tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddParams {
    #[schemars(description = "First addend")]
    pub a: f64,
    #[schemars(description = "Second addend")]
    pub b: f64,
}

/// Parameters for the get_time tool
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TimeParams {
    #[schemars(description = "Report the time in UTC instead of the server's local offset")]
    pub utc: Option<bool>,
}

/// Render `a + b = sum`, or `None` when the sum is not a finite number
fn format_sum(a: f64, b: f64) -> Option<String> {
    let sum = a + b;
    sum.is_finite().then(|| format!("{} + {} = {}", a, b, sum))
}

fn current_time(utc: bool) -> String {
    if utc {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl UtilityMcpServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Echo a message back, prefixed with 'Echo: '")]
    async fn echo(
        &self,
        Parameters(params): Parameters<EchoParams>,
    ) -> McpResult<CallToolResult> {
        tracing::info!(len = params.message.len(), "echo");
        Ok(text_success(format!("Echo: {}", params.message)))
    }

    #[tool(description = "Add two numbers and return the equation, e.g. '2 + 3 = 5'")]
    async fn add(
        &self,
        Parameters(params): Parameters<AddParams>,
    ) -> McpResult<CallToolResult> {
        tracing::info!(a = params.a, b = params.b, "add");
        match format_sum(params.a, params.b) {
            Some(text) => Ok(text_success(text)),
            None => Ok(text_error(format!(
                "{} + {} does not produce a finite number",
                params.a, params.b
            ))),
        }
    }

    #[tool(description = "Get the current date and time in RFC 3339 format (local offset by default, or UTC)")]
    async fn get_time(
        &self,
        Parameters(params): Parameters<TimeParams>,
    ) -> McpResult<CallToolResult> {
        let now = current_time(params.utc.unwrap_or(false));
        tracing::info!(%now, "get_time");
        Ok(text_success(format!("Current time: {}", now)))
    }
}

impl Default for UtilityMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

mcp_common::embeddable_server_handler!(UtilityMcpServer, INSTRUCTIONS);

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for UtilityMcpServer {
    fn server_name(&self) -> &str {
        "utility"
    }

    fn server_description(&self) -> Option<&str> {
        Some(INSTRUCTIONS)
    }

    fn server_version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "echo" => {
                let params: EchoParams = serde_json::from_value(params)?;
                self.echo(Parameters(params)).await.map_err(Into::into)
            }

            "add" => {
                let params: AddParams = serde_json::from_value(params)?;
                self.add(Parameters(params)).await.map_err(Into::into)
            }

            "get_time" => {
                let params: TimeParams = serde_json::from_value(params)?;
                self.get_time(Parameters(params)).await.map_err(Into::into)
            }

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_common::{is_error, result_text};
    use serde_json::json;

    #[test]
    fn test_format_sum() {
        assert_eq!(format_sum(2.0, 3.0).as_deref(), Some("2 + 3 = 5"));
        assert_eq!(format_sum(1.5, -0.25).as_deref(), Some("1.5 + -0.25 = 1.25"));
        assert_eq!(format_sum(f64::MAX, f64::MAX), None);
    }

    #[test]
    fn test_list_tools() {
        let server = UtilityMcpServer::new();
        let tools = server.list_tools();
        assert_eq!(tools.len(), 3);

        let names: Vec<&str> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"echo"));
        assert!(names.contains(&"add"));
        assert!(names.contains(&"get_time"));
    }

    #[tokio::test]
    async fn test_add() {
        let server = UtilityMcpServer::new();
        let result = server.dispatch("add", json!({"a": 2, "b": 3})).await;
        assert!(!is_error(&result));
        assert_eq!(result_text(&result), "2 + 3 = 5");
    }

    #[tokio::test]
    async fn test_echo() {
        let server = UtilityMcpServer::new();
        let result = server.dispatch("echo", json!({"message": "hi"})).await;
        assert!(!is_error(&result));
        assert_eq!(result_text(&result), "Echo: hi");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = UtilityMcpServer::new();
        let result = server.dispatch("multiply", json!({"a": 2, "b": 3})).await;
        assert!(is_error(&result));
        assert!(result_text(&result).contains("unknown tool: multiply"));

        let direct = server.call_tool("multiply", json!({})).await;
        assert!(matches!(direct, Err(EmbeddableError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_rejects_wrong_type() {
        let server = UtilityMcpServer::new();
        let result = server.dispatch("add", json!({"a": "2", "b": 3})).await;
        assert!(is_error(&result));
        assert!(result_text(&result).contains("`a`"));
    }

    #[tokio::test]
    async fn test_echo_requires_message() {
        let server = UtilityMcpServer::new();
        let result = server.dispatch("echo", json!({})).await;
        assert!(is_error(&result));
        assert!(result_text(&result).contains("missing required argument `message`"));
    }

    #[tokio::test]
    async fn test_get_time_utc() {
        let server = UtilityMcpServer::new();
        let result = server.dispatch("get_time", json!({"utc": true})).await;
        assert!(!is_error(&result));

        let text = result_text(&result);
        let stamp = text.strip_prefix("Current time: ").unwrap();
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn test_get_time_defaults_to_local() {
        let server = UtilityMcpServer::new();
        let result = server.dispatch("get_time", Value::Null).await;
        assert!(!is_error(&result));

        let text = result_text(&result);
        let stamp = text.strip_prefix("Current time: ").unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }
}
