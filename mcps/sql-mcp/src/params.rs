//! Parameter types for SQL MCP tools
//!
//! Shape (required fields, primitive types, unknown fields) is checked
//! against the generated schema before deserialization; the helpers here
//! apply the value constraints that a schema type cannot express.

use mcp_common::ValidationError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::format::ResponseFormat;

/// Longest query text accepted, in characters
pub const MAX_QUERY_CHARS: usize = 5000;

/// Longest schema or table name accepted, in characters
pub const MAX_IDENTIFIER_CHARS: usize = 100;

/// Rows returned by sql_get_table_sample when no limit is given
pub const DEFAULT_SAMPLE_ROWS: i64 = 10;

/// Upper bound on sql_get_table_sample's limit
pub const MAX_SAMPLE_ROWS: i64 = 100;

/// Parameters for sql_execute_query
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExecuteQueryParams {
    #[schemars(
        description = "SQL query to execute (e.g., 'SELECT * FROM users WHERE age > 25 LIMIT 10'). Only single SELECT statements are permitted."
    )]
    pub query: String,

    #[schemars(
        description = "Output format: 'markdown' for a human-readable table or 'json' for structured data"
    )]
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Parameters for sql_list_tables
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListTablesParams {
    #[schemars(
        description = "Schema to list tables from (e.g., 'public', 'analytics'). Defaults to the backend's default schema."
    )]
    pub schema: Option<String>,

    #[schemars(description = "Output format: 'markdown' or 'json'")]
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Parameters for sql_describe_table
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DescribeTableParams {
    #[schemars(description = "Name of the table to describe (e.g., 'users', 'orders')")]
    pub table_name: String,

    #[schemars(description = "Schema containing the table")]
    pub schema: Option<String>,

    #[schemars(description = "Output format: 'markdown' or 'json'")]
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Parameters for sql_get_table_sample
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TableSampleParams {
    #[schemars(description = "Name of the table to sample (e.g., 'users', 'products')")]
    pub table_name: String,

    #[schemars(description = "Schema containing the table")]
    pub schema: Option<String>,

    #[schemars(description = "Number of rows to return (1-100, default 10)")]
    pub limit: Option<i64>,

    #[schemars(description = "Output format: 'markdown' or 'json'")]
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Trimmed query text, non-empty and within [`MAX_QUERY_CHARS`]
pub fn query_text(query: &str) -> Result<&str, ValidationError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ValidationError::invalid("query", "must not be empty"));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ValidationError::invalid(
            "query",
            format!("must be at most {} characters", MAX_QUERY_CHARS),
        ));
    }
    Ok(query)
}

/// Trimmed identifier, 1 to [`MAX_IDENTIFIER_CHARS`] characters
pub fn identifier<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::invalid(field, "must not be empty"));
    }
    if value.chars().count() > MAX_IDENTIFIER_CHARS {
        return Err(ValidationError::invalid(
            field,
            format!("must be at most {} characters", MAX_IDENTIFIER_CHARS),
        ));
    }
    Ok(value)
}

/// Sample size, defaulting to [`DEFAULT_SAMPLE_ROWS`]
pub fn sample_limit(limit: Option<i64>) -> Result<u32, ValidationError> {
    let limit = limit.unwrap_or(DEFAULT_SAMPLE_ROWS);
    if !(1..=MAX_SAMPLE_ROWS).contains(&limit) {
        return Err(ValidationError::invalid(
            "limit",
            format!("must be between 1 and {}, got {}", MAX_SAMPLE_ROWS, limit),
        ));
    }
    // In range, so the conversion cannot fail
    Ok(u32::try_from(limit).unwrap_or(DEFAULT_SAMPLE_ROWS as u32))
}
