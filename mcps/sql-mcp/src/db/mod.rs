//! Database access behind a narrow capability trait
//!
//! The tools only need four operations: run an admitted query, list tables,
//! describe a table, and sample rows. [`Database`] exposes exactly those, so
//! the admission filter, formatter and tool handlers can be exercised
//! without a live server. Connection management stays with the driver:
//! a lazily-connecting `sqlx` pool for PostgreSQL, a mutex-guarded
//! `rusqlite` connection for SQLite.

pub mod postgres;
pub mod sqlite;

use mcp_common::async_trait;
use serde::Serialize;
use serde_json::Value;

pub use postgres::PostgresDatabase;
pub use sqlite::SqliteDatabase;

/// Rows returned by a query, with column names in select order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows as arrays of scalar values, one per column
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Table listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table_name: String,
    pub schema: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub row_count: i64,
}

/// Column definition from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescription {
    pub column_name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Broad category of a driver failure, used to pick a hint for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    Syntax,
    UndefinedTable,
    UndefinedColumn,
    Connection,
    Other,
}

/// A database error, carrying the driver's message verbatim
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Suggested next step for the caller, if the failure has an obvious one
    pub fn hint(&self) -> Option<&'static str> {
        match self.kind {
            DriverErrorKind::Syntax => Some("Please check your query syntax and try again."),
            DriverErrorKind::UndefinedTable => {
                Some("Use 'sql_list_tables' to see available tables.")
            }
            DriverErrorKind::UndefinedColumn => {
                Some("Use 'sql_describe_table' to see table structure.")
            }
            DriverErrorKind::Connection => {
                Some("Please verify the database connection settings.")
            }
            DriverErrorKind::Other => None,
        }
    }
}

/// Read access to a relational database
#[async_trait]
pub trait Database: Send + Sync {
    /// Short backend name for logs and server info
    fn backend_name(&self) -> &'static str;

    /// Schema used when a tool call does not name one
    fn default_schema(&self) -> &str;

    /// Execute one statement and collect every row
    ///
    /// The caller is responsible for admission; this runs whatever it is given.
    async fn fetch(&self, sql: &str) -> Result<QueryResult, DriverError>;

    /// Tables in `schema`, ordered by name, with row counts
    async fn list_tables(&self, schema: &str) -> Result<Vec<TableSummary>, DriverError>;

    /// Columns of `schema.table` in ordinal order; empty if the table does not exist
    async fn describe_table(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescription>, DriverError>;

    /// Up to `limit` rows of `schema.table`
    async fn sample(
        &self,
        schema: &str,
        table: &str,
        limit: u32,
    ) -> Result<QueryResult, DriverError> {
        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {}",
            quote_ident(schema),
            quote_ident(table),
            limit
        );
        self.fetch(&sql).await
    }
}

/// Quote an identifier for interpolation into SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
