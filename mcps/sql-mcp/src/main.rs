//! SQL MCP Server
//!
//! Serves read-only database tools over stdio. The backend and connection
//! settings come from the config file and environment; see `config`.

use sql_mcp::SqlMcpServer;

mcp_common::serve_stdio!(SqlMcpServer, "sql_mcp", SqlMcpServer::from_env);
