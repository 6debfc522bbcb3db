//! SQLite backend on a single `rusqlite` connection

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mcp_common::async_trait;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{
    quote_ident, ColumnDescription, Database, DriverError, DriverErrorKind, QueryResult,
    TableSummary,
};

impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        let message = err.to_string();
        let kind = match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DriverErrorKind::Connection
            }
            _ if message.contains("no such table") => DriverErrorKind::UndefinedTable,
            _ if message.contains("no such column") => DriverErrorKind::UndefinedColumn,
            _ if message.contains("syntax error") || message.contains("incomplete input") => {
                DriverErrorKind::Syntax
            }
            _ => DriverErrorKind::Other,
        };
        DriverError::new(kind, message)
    }
}

/// SQLite database opened read-only
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open an existing database file read-only
    pub fn open(path: &Path, timeout: Duration) -> Result<Self, DriverError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(timeout)?;
        tracing::info!("Opened SQLite database at {:?}", path);
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

fn to_json(value: rusqlite::types::Value) -> Value {
    match value {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(i) => Value::from(i),
        rusqlite::types::Value::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        rusqlite::types::Value::Text(s) => Value::String(s),
        rusqlite::types::Value::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}

fn run_query(conn: &Connection, sql: &str) -> Result<QueryResult, DriverError> {
    let mut stmt = conn.prepare(sql)?;

    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map([], |row| {
            (0..columns.len())
                .map(|i| row.get::<_, rusqlite::types::Value>(i).map(to_json))
                .collect::<Result<Vec<_>, _>>()
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryResult::new(columns, rows))
}

#[async_trait]
impl Database for SqliteDatabase {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn default_schema(&self) -> &str {
        "main"
    }

    async fn fetch(&self, sql: &str) -> Result<QueryResult, DriverError> {
        let conn = self.conn.lock().await;
        run_query(&conn, sql)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableSummary>, DriverError> {
        let conn = self.conn.lock().await;

        let query = format!(
            "SELECT name, type FROM {}.sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name",
            quote_ident(schema)
        );
        let mut stmt = conn.prepare(&query)?;
        let entries = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = Vec::with_capacity(entries.len());
        for (name, kind) in entries {
            let count_query = format!(
                "SELECT COUNT(*) FROM {}.{}",
                quote_ident(schema),
                quote_ident(&name)
            );
            let row_count: i64 = conn.query_row(&count_query, [], |row| row.get(0))?;
            tables.push(TableSummary {
                table_name: name,
                schema: schema.to_string(),
                kind,
                row_count,
            });
        }

        Ok(tables)
    }

    async fn describe_table(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescription>, DriverError> {
        let conn = self.conn.lock().await;

        let pragma = format!(
            "PRAGMA {}.table_info('{}')",
            quote_ident(schema),
            table.replace('\'', "''")
        );
        let mut stmt = conn.prepare(&pragma)?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnDescription {
                    column_name: row.get(1)?,
                    data_type: row.get(2)?,
                    nullable: row.get::<_, i64>(3)? == 0,
                    default_value: row.get(4)?,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(columns)
    }
}
