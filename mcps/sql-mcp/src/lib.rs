//! SQL MCP Library
//!
//! Read-only access to a PostgreSQL or SQLite database over MCP. Queries
//! pass a textual admission check before reaching the driver, and results
//! are rendered as markdown or JSON within a character budget.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sql_mcp::{SqlMcpServer, SqliteDatabase};
//!
//! let db = SqliteDatabase::open(path, timeout)?;
//! let server = SqlMcpServer::with_database(Arc::new(db), 25_000);
//! let result = server.dispatch("sql_list_tables", serde_json::json!({})).await;
//! ```

pub mod admission;
pub mod config;
pub mod db;
pub mod format;
pub mod params;
pub mod server;

// Re-export main server type
pub use server::SqlMcpServer;

pub use admission::{admit, AdmissionDenied};
pub use config::SqlConfig;
pub use db::{Database, DriverError, PostgresDatabase, QueryResult, SqliteDatabase};
pub use format::{render, ResponseFormat};

// Re-export parameter types for direct API usage
pub use params::{DescribeTableParams, ExecuteQueryParams, ListTablesParams, TableSampleParams};

// Re-export embeddable trait for in-process use
pub use mcp_common::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
