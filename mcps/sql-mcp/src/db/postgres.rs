//! PostgreSQL backend on a `sqlx` connection pool
//!
//! Ad-hoc statements go through the simple query protocol (`raw_sql`), which
//! returns every column in its text representation. Values are then typed by
//! the column's type name, so arbitrary result shapes decode without a
//! per-type mapping for every PostgreSQL type.

use std::time::Duration;

use mcp_common::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo};

use super::{
    quote_ident, ColumnDescription, Database, DriverError, DriverErrorKind, QueryResult,
    TableSummary,
};
use crate::config::PostgresConfig;

const LIST_TABLES_SQL: &str = "\
    SELECT tablename::text, schemaname::text \
    FROM pg_tables \
    WHERE schemaname = $1 \
    ORDER BY tablename";

const DESCRIBE_COLUMNS_SQL: &str = "\
    SELECT column_name::text, data_type::text, character_maximum_length::int4, \
           is_nullable::text, column_default::text \
    FROM information_schema.columns \
    WHERE table_schema = $1 AND table_name = $2 \
    ORDER BY ordinal_position";

const PRIMARY_KEY_SQL: &str = "\
    SELECT kcu.column_name::text \
    FROM information_schema.table_constraints tc \
    JOIN information_schema.key_column_usage kcu \
      ON tc.constraint_name = kcu.constraint_name \
     AND tc.table_schema = kcu.table_schema \
     AND tc.table_name = kcu.table_name \
    WHERE tc.table_schema = $1 AND tc.table_name = $2 \
      AND tc.constraint_type = 'PRIMARY KEY'";

impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("42601") => DriverErrorKind::Syntax,
                Some("42P01") => DriverErrorKind::UndefinedTable,
                Some("42703") => DriverErrorKind::UndefinedColumn,
                _ => DriverErrorKind::Other,
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DriverErrorKind::Connection,
            _ => DriverErrorKind::Other,
        };
        DriverError::new(kind, err.to_string())
    }
}

/// PostgreSQL database reached through a shared pool
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Build a pool that connects on first use
    ///
    /// `timeout` bounds both connection acquisition and each statement
    /// (sent as the session's `statement_timeout`).
    pub fn connect_lazy(config: &PostgresConfig, timeout: Duration) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .options([("statement_timeout", timeout.as_millis().to_string())]);

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(timeout)
            .connect_lazy_with(options);

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Configured PostgreSQL pool"
        );

        Self::from_pool(pool)
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Type a text-format value by its PostgreSQL type name
fn text_to_json(type_name: &str, text: Option<String>) -> Value {
    let Some(text) = text else {
        return Value::Null;
    };

    match type_name {
        "BOOL" => Value::Bool(text == "t"),
        "INT2" | "INT4" | "INT8" | "OID" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text)),
        "FLOAT4" | "FLOAT8" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text)),
        "JSON" | "JSONB" => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        // NUMERIC keeps its exact decimal text
        _ => Value::String(text),
    }
}

fn to_query_result(rows: &[PgRow]) -> Result<QueryResult, DriverError> {
    let Some(first) = rows.first() else {
        return Ok(QueryResult::default());
    };

    let columns: Vec<String> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let types: Vec<String> = first
        .columns()
        .iter()
        .map(|c| c.type_info().name().to_string())
        .collect();

    let values = rows
        .iter()
        .map(|row| {
            types
                .iter()
                .enumerate()
                .map(|(i, type_name)| {
                    let text: Option<String> = row.try_get_unchecked(i)?;
                    Ok(text_to_json(type_name, text))
                })
                .collect::<Result<Vec<_>, sqlx::Error>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryResult::new(columns, values))
}

#[async_trait]
impl Database for PostgresDatabase {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn default_schema(&self) -> &str {
        "public"
    }

    async fn fetch(&self, sql: &str) -> Result<QueryResult, DriverError> {
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        to_query_result(&rows)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableSummary>, DriverError> {
        let entries: Vec<(String, String)> = sqlx::query_as(LIST_TABLES_SQL)
            .bind(schema)
            .fetch_all(&self.pool)
            .await?;

        let mut tables = Vec::with_capacity(entries.len());
        for (name, schema_name) in entries {
            let count_query = format!(
                "SELECT COUNT(*) FROM {}.{}",
                quote_ident(&schema_name),
                quote_ident(&name)
            );
            let row_count: i64 = sqlx::query_scalar(&count_query)
                .fetch_one(&self.pool)
                .await?;
            tables.push(TableSummary {
                table_name: name,
                schema: schema_name,
                kind: "table".to_string(),
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
        let rows: Vec<(String, String, Option<i32>, String, Option<String>)> =
            sqlx::query_as(DESCRIBE_COLUMNS_SQL)
                .bind(schema)
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let primary_keys: Vec<String> = sqlx::query_scalar(PRIMARY_KEY_SQL)
            .bind(schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, max_len, is_nullable, default_value)| {
                let data_type = match max_len {
                    Some(len) => format!("{}({})", data_type, len),
                    None => data_type,
                };
                ColumnDescription {
                    primary_key: primary_keys.contains(&name),
                    column_name: name,
                    data_type,
                    nullable: is_nullable == "YES",
                    default_value,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_to_json_typing() {
        assert_eq!(text_to_json("INT4", Some("42".into())), Value::from(42));
        assert_eq!(text_to_json("INT8", Some("-7".into())), Value::from(-7));
        assert_eq!(text_to_json("FLOAT8", Some("1.5".into())), Value::from(1.5));
        assert_eq!(text_to_json("BOOL", Some("t".into())), Value::Bool(true));
        assert_eq!(text_to_json("BOOL", Some("f".into())), Value::Bool(false));
        assert_eq!(
            text_to_json("JSONB", Some(r#"{"a": [1, 2]}"#.into())),
            serde_json::json!({"a": [1, 2]})
        );
        assert_eq!(text_to_json("TEXT", None), Value::Null);
    }

    #[test]
    fn test_text_to_json_keeps_exact_text() {
        assert_eq!(
            text_to_json("NUMERIC", Some("12345678901234567890.01".into())),
            Value::from("12345678901234567890.01")
        );
        assert_eq!(
            text_to_json("TIMESTAMPTZ", Some("2024-01-01 00:00:00+00".into())),
            Value::from("2024-01-01 00:00:00+00")
        );
        // Special float values have no JSON number form
        assert_eq!(text_to_json("FLOAT8", Some("NaN".into())), Value::from("NaN"));
    }
}
