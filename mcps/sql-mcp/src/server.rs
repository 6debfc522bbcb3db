//! SQL MCP Server implementation

use std::sync::Arc;

use anyhow::Context;
use mcp_common::{
    async_trait, json_success, text_error, text_success, EmbeddableError, EmbeddableMcp,
    EmbeddableResult, McpResult, ValidationError,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Tool},
    tool, tool_router,
};
use serde_json::Value;

use crate::admission;
use crate::config::{Backend, SqlConfig};
use crate::db::{
    ColumnDescription, Database, DriverError, DriverErrorKind, PostgresDatabase, SqliteDatabase,
    TableSummary,
};
use crate::format::{self, ResponseFormat};
use crate::params::{
    identifier, query_text, sample_limit, DescribeTableParams, ExecuteQueryParams,
    ListTablesParams, TableSampleParams,
};

const INSTRUCTIONS: &str = "Read-only SQL database server. Use sql_list_tables to discover \
    tables, sql_describe_table to inspect columns, sql_get_table_sample to preview rows and \
    sql_execute_query to run a single SELECT statement. Results are returned as markdown \
    tables or JSON and are truncated to fit the configured character limit.";

/// SQL MCP Server
#[derive(Clone)]
pub struct SqlMcpServer {
    db: Arc<dyn Database>,
    character_limit: usize,
    tool_router: ToolRouter<Self>,
}

impl SqlMcpServer {
    /// Create a server from the config file and environment
    pub fn from_env() -> anyhow::Result<Self> {
        let config = SqlConfig::load()?;
        Self::from_config(&config)
    }

    /// Create a server for an already-loaded config
    ///
    /// PostgreSQL connects lazily on first use; a SQLite file is opened now,
    /// so a missing file fails here.
    pub fn from_config(config: &SqlConfig) -> anyhow::Result<Self> {
        let timeout = config.database.timeout();
        let db: Arc<dyn Database> = match config.database.backend {
            Backend::Postgres => Arc::new(PostgresDatabase::connect_lazy(
                &config.database.postgres,
                timeout,
            )),
            Backend::Sqlite => {
                let path = &config.database.sqlite.path;
                let db = SqliteDatabase::open(path, timeout)
                    .with_context(|| format!("Failed to open SQLite database at {:?}", path))?;
                Arc::new(db)
            }
        };

        Ok(Self::with_database(db, config.output.character_limit))
    }

    /// Create a server over any [`Database`]
    pub fn with_database(db: Arc<dyn Database>, character_limit: usize) -> Self {
        tracing::info!(
            backend = db.backend_name(),
            character_limit,
            "SQL server ready"
        );
        Self {
            db,
            character_limit,
            tool_router: Self::tool_router(),
        }
    }

    fn schema_or_default<'a>(&'a self, schema: Option<&'a str>) -> Result<&'a str, ValidationError> {
        match schema {
            Some(schema) => identifier("schema", schema),
            None => Ok(self.db.default_schema()),
        }
    }
}

fn invalid_params(err: ValidationError) -> CallToolResult {
    tracing::warn!(error = %err, "rejected tool arguments");
    text_error(EmbeddableError::from(err).to_string())
}

/// Driver failure as shown to the caller: label, driver message, then a hint
fn driver_failure(operation: &str, err: &DriverError) -> CallToolResult {
    tracing::warn!(operation, kind = ?err.kind, error = %err, "database error");

    let label = match err.kind {
        DriverErrorKind::Syntax => "SQL syntax error".to_string(),
        DriverErrorKind::UndefinedTable => "Table not found".to_string(),
        DriverErrorKind::UndefinedColumn => "Column not found".to_string(),
        DriverErrorKind::Connection => "Database connection error".to_string(),
        DriverErrorKind::Other => format!("Error {}", operation),
    };

    match err.hint() {
        Some(hint) => text_error(format!("{}: {}\n\n{}", label, err, hint)),
        None => text_error(format!("{}: {}", label, err)),
    }
}

fn table_not_found(schema: &str, table: &str) -> CallToolResult {
    text_error(format!(
        "Table '{}.{}' not found.\n\nUse 'sql_list_tables' to see available tables.",
        schema, table
    ))
}

/// Integer with comma thousands separators
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn tables_markdown(schema: &str, tables: &[TableSummary]) -> String {
    let mut out = format!("## Tables in schema '{}'\n\n", schema);
    for table in tables {
        out.push_str(&format!(
            "- **{}** ({} rows)\n",
            table.table_name,
            group_thousands(table.row_count)
        ));
    }
    out.push_str(&format!("\nTotal: {} table(s)", tables.len()));
    out
}

fn columns_markdown(schema: &str, table: &str, columns: &[ColumnDescription]) -> String {
    let mut out = format!("## Table: {}.{}\n\n### Columns\n\n", schema, table);
    out.push_str("| Column | Type | Nullable | Default | Primary Key |\n");
    out.push_str("|--------|------|----------|---------|-------------|\n");
    for col in columns {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            col.column_name,
            col.data_type,
            if col.nullable { "YES" } else { "NO" },
            col.default_value.as_deref().unwrap_or("-"),
            if col.primary_key { "✓" } else { "" },
        ));
    }
    out
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl SqlMcpServer {
    #[tool(
        description = "Execute a read-only SQL query. Only a single SELECT statement is accepted; \
        statements containing INSERT, UPDATE, DELETE, DROP, ALTER, TRUNCATE, CREATE, GRANT or \
        REVOKE are rejected. Returns rows as a markdown table or JSON, truncated to fit the \
        character limit."
    )]
    async fn sql_execute_query(
        &self,
        Parameters(params): Parameters<ExecuteQueryParams>,
    ) -> McpResult<CallToolResult> {
        let query = match query_text(&params.query) {
            Ok(query) => query,
            Err(e) => return Ok(invalid_params(e)),
        };

        let statement = match admission::admit(query) {
            Ok(statement) => statement,
            Err(denied) => {
                tracing::warn!(reason = %denied, "query denied");
                return Ok(text_error(denied.to_string()));
            }
        };

        let result = match self.db.fetch(statement).await {
            Ok(result) => result,
            Err(e) => return Ok(driver_failure("executing query", &e)),
        };

        if result.is_empty() {
            tracing::info!(rows = 0, "sql_execute_query");
            return Ok(text_success(
                "Query executed successfully but returned no rows.",
            ));
        }

        let rendered = format::render(&result, params.response_format, self.character_limit);
        tracing::info!(
            rows = rendered.total_rows,
            shown = rendered.rows_shown,
            truncated = rendered.truncated,
            "sql_execute_query"
        );

        let text = match params.response_format {
            ResponseFormat::Markdown => format!(
                "Query returned {} row(s):\n\n{}",
                rendered.total_rows, rendered.text
            ),
            ResponseFormat::Json => rendered.text,
        };
        Ok(text_success(text))
    }

    #[tool(
        description = "List the tables in a schema with their row counts. The schema defaults \
        to 'public' on PostgreSQL and 'main' on SQLite."
    )]
    async fn sql_list_tables(
        &self,
        Parameters(params): Parameters<ListTablesParams>,
    ) -> McpResult<CallToolResult> {
        let schema = match self.schema_or_default(params.schema.as_deref()) {
            Ok(schema) => schema,
            Err(e) => return Ok(invalid_params(e)),
        };

        let tables = match self.db.list_tables(schema).await {
            Ok(tables) => tables,
            Err(e) => return Ok(driver_failure("listing tables", &e)),
        };
        tracing::info!(schema, tables = tables.len(), "sql_list_tables");

        if tables.is_empty() {
            return Ok(text_success(format!(
                "No tables found in schema '{}'.",
                schema
            )));
        }

        match params.response_format {
            ResponseFormat::Markdown => Ok(text_success(tables_markdown(schema, &tables))),
            ResponseFormat::Json => json_success(&tables),
        }
    }

    #[tool(
        description = "Describe a table's columns: name, data type, nullability, default value \
        and primary key membership."
    )]
    async fn sql_describe_table(
        &self,
        Parameters(params): Parameters<DescribeTableParams>,
    ) -> McpResult<CallToolResult> {
        let (schema, table) = match self
            .schema_or_default(params.schema.as_deref())
            .and_then(|s| Ok((s, identifier("table_name", &params.table_name)?)))
        {
            Ok(names) => names,
            Err(e) => return Ok(invalid_params(e)),
        };

        let columns = match self.db.describe_table(schema, table).await {
            Ok(columns) => columns,
            Err(e) => return Ok(driver_failure("describing table", &e)),
        };
        tracing::info!(schema, table, columns = columns.len(), "sql_describe_table");

        if columns.is_empty() {
            return Ok(table_not_found(schema, table));
        }

        match params.response_format {
            ResponseFormat::Markdown => Ok(text_success(columns_markdown(schema, table, &columns))),
            ResponseFormat::Json => json_success(&columns),
        }
    }

    #[tool(
        description = "Fetch up to 'limit' rows (1-100, default 10) from a table to preview its \
        contents."
    )]
    async fn sql_get_table_sample(
        &self,
        Parameters(params): Parameters<TableSampleParams>,
    ) -> McpResult<CallToolResult> {
        let (schema, table, limit) = match self
            .schema_or_default(params.schema.as_deref())
            .and_then(|s| {
                let table = identifier("table_name", &params.table_name)?;
                Ok((s, table, sample_limit(params.limit)?))
            }) {
            Ok(args) => args,
            Err(e) => return Ok(invalid_params(e)),
        };

        let result = match self.db.sample(schema, table, limit).await {
            Ok(result) => result,
            Err(e) if e.kind == DriverErrorKind::UndefinedTable => {
                tracing::warn!(schema, table, "sample of unknown table");
                return Ok(table_not_found(schema, table));
            }
            Err(e) => return Ok(driver_failure("sampling table", &e)),
        };

        if result.is_empty() {
            tracing::info!(schema, table, rows = 0, "sql_get_table_sample");
            return Ok(text_success(format!(
                "Table '{}.{}' exists but contains no data.",
                schema, table
            )));
        }

        let rendered = format::render(&result, params.response_format, self.character_limit);
        tracing::info!(
            schema,
            table,
            rows = rendered.total_rows,
            truncated = rendered.truncated,
            "sql_get_table_sample"
        );

        let text = match params.response_format {
            ResponseFormat::Markdown => format!(
                "Sample data from {}.{} (showing {} of {} requested rows):\n\n{}",
                schema, table, rendered.total_rows, limit, rendered.text
            ),
            ResponseFormat::Json => rendered.text,
        };
        Ok(text_success(text))
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

mcp_common::embeddable_server_handler!(SqlMcpServer, INSTRUCTIONS);

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for SqlMcpServer {
    fn server_name(&self) -> &str {
        "sql"
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
            "sql_execute_query" => {
                let params: ExecuteQueryParams = serde_json::from_value(params)?;
                self.sql_execute_query(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "sql_list_tables" => {
                let params: ListTablesParams = serde_json::from_value(params)?;
                self.sql_list_tables(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "sql_describe_table" => {
                let params: DescribeTableParams = serde_json::from_value(params)?;
                self.sql_describe_table(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "sql_get_table_sample" => {
                let params: TableSampleParams = serde_json::from_value(params)?;
                self.sql_get_table_sample(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}
