//! Protocol handler wiring for embeddable servers
//!
//! `#[tool_handler]` routes `tools/call` straight into the tool router, which
//! answers unknown tools and malformed arguments with protocol errors. The
//! [`embeddable_server_handler!`] macro instead answers `tools/list` from the
//! router's descriptors and sends every `tools/call` through
//! [`crate::EmbeddableMcp::dispatch`], so those failures reach the client as
//! error-flagged results.

/// Implement `rmcp::ServerHandler` for a type that implements [`crate::EmbeddableMcp`]
///
/// The invoking crate must depend on `rmcp` and `serde_json`.
///
/// ```rust,ignore
/// mcp_common::embeddable_server_handler!(UtilityMcpServer, INSTRUCTIONS);
/// ```
#[macro_export]
macro_rules! embeddable_server_handler {
    ($server_type:ty, $instructions:expr) => {
        impl rmcp::ServerHandler for $server_type {
            fn get_info(&self) -> rmcp::model::ServerInfo {
                rmcp::model::ServerInfo {
                    instructions: Some(($instructions).into()),
                    capabilities: rmcp::model::ServerCapabilities::builder()
                        .enable_tools()
                        .build(),
                    ..Default::default()
                }
            }

            async fn list_tools(
                &self,
                _request: Option<rmcp::model::PaginatedRequestParam>,
                _context: rmcp::service::RequestContext<rmcp::RoleServer>,
            ) -> Result<rmcp::model::ListToolsResult, rmcp::ErrorData> {
                Ok(rmcp::model::ListToolsResult::with_all_items(
                    <Self as $crate::EmbeddableMcp>::list_tools(self),
                ))
            }

            async fn call_tool(
                &self,
                request: rmcp::model::CallToolRequestParam,
                _context: rmcp::service::RequestContext<rmcp::RoleServer>,
            ) -> Result<rmcp::model::CallToolResult, rmcp::ErrorData> {
                let arguments = request
                    .arguments
                    .map(serde_json::Value::Object)
                    .unwrap_or(serde_json::Value::Null);
                Ok(<Self as $crate::EmbeddableMcp>::dispatch(self, &request.name, arguments).await)
            }
        }
    };
}
