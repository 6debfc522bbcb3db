//! Utility MCP Server
//!
//! Provides echo, addition and current-time tools.

use utility_mcp::UtilityMcpServer;

mcp_common::serve_stdio!(UtilityMcpServer, "utility_mcp");
