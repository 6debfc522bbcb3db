//! Rendering query results within a character budget
//!
//! [`render`] turns a [`QueryResult`] into a markdown table or a JSON array
//! of row objects. Rows are added in order while the rendered body stays
//! within the budget; the first row that would overflow it stops the loop
//! and a notice reports how many rows made it in.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::QueryResult;

/// Output format for tool responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable markdown table
    #[default]
    Markdown,
    /// JSON array of row objects keyed by column name
    Json,
}

/// Rendered output and how much of the result it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    pub truncated: bool,
    pub rows_shown: usize,
    pub total_rows: usize,
}

/// Text around the serialized rows
///
/// With at least one row the body is `open + rows.join(separator) + close`;
/// with none it is `empty`.
struct Frame {
    open: String,
    separator: &'static str,
    close: &'static str,
    empty: String,
}

impl Frame {
    fn markdown(columns: &[String]) -> Self {
        let header = format!(
            "| {} |",
            columns.iter().map(|c| escape_cell(c)).collect::<Vec<_>>().join(" | ")
        );
        let divider = format!("|{}", "---|".repeat(columns.len()));
        Self {
            open: format!("{}\n{}\n", header, divider),
            separator: "\n",
            close: "",
            empty: format!("{}\n{}", header, divider),
        }
    }

    fn json() -> Self {
        Self {
            open: "[\n".to_string(),
            separator: ",\n",
            close: "\n]",
            empty: "[]".to_string(),
        }
    }

    fn build(&self, rows: &[String]) -> String {
        if rows.is_empty() {
            return self.empty.clone();
        }
        format!("{}{}{}", self.open, rows.join(self.separator), self.close)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Render `result`, keeping the body within `limit` characters
///
/// Output is deterministic for a given input. When rows are dropped the
/// text ends with a notice; if not even the empty frame fits, the notice is
/// all that is returned.
pub fn render(result: &QueryResult, format: ResponseFormat, limit: usize) -> Formatted {
    let (frame, rows) = match format {
        ResponseFormat::Markdown => (
            Frame::markdown(&result.columns),
            result.rows.iter().map(|r| markdown_row(r)).collect::<Vec<_>>(),
        ),
        ResponseFormat::Json => {
            let keys = object_keys(&result.columns);
            (
                Frame::json(),
                result
                    .rows
                    .iter()
                    .map(|r| json_row(&keys, r))
                    .collect::<Vec<_>>(),
            )
        }
    };

    let total_rows = rows.len();
    let fixed = char_len(&frame.open) + char_len(frame.close);
    let separator = char_len(frame.separator);

    let mut used = fixed;
    let mut rows_shown = 0;
    for (i, row) in rows.iter().enumerate() {
        let next = used + char_len(row) + if i > 0 { separator } else { 0 };
        if next > limit {
            break;
        }
        used = next;
        rows_shown += 1;
    }

    if rows_shown == total_rows {
        return Formatted {
            text: frame.build(&rows),
            truncated: false,
            rows_shown,
            total_rows,
        };
    }

    let notice = format!(
        "[Showing {} of {} rows; output truncated to fit the {}-character limit. \
         Add a LIMIT or WHERE clause to narrow the result.]",
        rows_shown, total_rows, limit
    );
    let body = frame.build(&rows[..rows_shown]);
    let text = if char_len(&body) > limit {
        notice
    } else {
        format!("{}\n\n{}", body, notice)
    };

    Formatted {
        text,
        truncated: true,
        rows_shown,
        total_rows,
    }
}

/// Scalar as it appears in a table cell
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape_cell(s),
        nested => escape_cell(&nested.to_string()),
    }
}

/// Escape the grid's own delimiters
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "\\n")
        .replace(['\n', '\r'], "\\n")
}

fn markdown_row(values: &[Value]) -> String {
    format!(
        "| {} |",
        values.iter().map(cell_text).collect::<Vec<_>>().join(" | ")
    )
}

/// Object keys for the JSON rows
///
/// Repeated column names (`SELECT 1 AS a, 2 AS a`) get a `_2`, `_3`, ...
/// suffix so every value keeps its own key.
fn object_keys(columns: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = columns.iter().cloned().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    columns
        .iter()
        .map(|column| {
            if seen.insert(column) {
                return column.clone();
            }
            let key = (2..)
                .map(|n| format!("{}_{}", column, n))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_else(|| column.clone());
            taken.insert(key.clone());
            key
        })
        .collect()
}

/// One row as a JSON object with keys in column order
struct RowObject<'a> {
    keys: &'a [String],
    values: &'a [Value],
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (key, value) in self.keys.iter().zip(self.values) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Pretty-printed row object, indented to sit inside the top-level array
fn json_row(keys: &[String], values: &[Value]) -> String {
    let object = serde_json::to_string_pretty(&RowObject { keys, values })
        .unwrap_or_else(|_| "{}".to_string());
    object
        .lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> QueryResult {
        QueryResult::new(
            vec!["id".into(), "name".into(), "score".into()],
            vec![
                vec![json!(1), json!("ada"), json!(9.5)],
                vec![json!(2), json!("linus"), Value::Null],
                vec![json!(3), json!("grace"), json!(7)],
            ],
        )
    }

    #[test]
    fn test_markdown_table() {
        let out = render(&sample(), ResponseFormat::Markdown, 10_000);
        assert!(!out.truncated);
        assert_eq!(out.rows_shown, 3);
        assert_eq!(
            out.text,
            "| id | name | score |\n\
             |---|---|---|\n\
             | 1 | ada | 9.5 |\n\
             | 2 | linus | NULL |\n\
             | 3 | grace | 7 |"
        );
    }

    #[test]
    fn test_markdown_escapes_delimiters() {
        let result = QueryResult::new(
            vec!["a|b".into()],
            vec![vec![json!("x|y\nz")], vec![json!(true)], vec![json!({"k": [1]})]],
        );
        let out = render(&result, ResponseFormat::Markdown, 10_000);
        assert!(out.text.starts_with("| a\\|b |"));
        assert!(out.text.contains("| x\\|y\\nz |"));
        assert!(out.text.contains("| true |"));
        assert!(out.text.contains(r#"| {"k":[1]} |"#));
    }

    #[test]
    fn test_json_rows_keep_column_order() {
        let result = QueryResult::new(
            vec!["zeta".into(), "alpha".into()],
            vec![vec![json!(1), json!("a")]],
        );
        let out = render(&result, ResponseFormat::Json, 10_000);
        assert_eq!(out.text, "[\n  {\n    \"zeta\": 1,\n    \"alpha\": \"a\"\n  }\n]");
    }

    #[test]
    fn test_json_matches_pretty_array() {
        let out = render(&sample(), ResponseFormat::Json, 10_000);
        let parsed: Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"id": 1, "name": "ada", "score": 9.5},
                {"id": 2, "name": "linus", "score": null},
                {"id": 3, "name": "grace", "score": 7}
            ])
        );
        assert_eq!(out.text, serde_json::to_string_pretty(&parsed).unwrap());
    }

    #[test]
    fn test_empty_result() {
        let result = QueryResult::new(vec!["id".into()], vec![]);
        let md = render(&result, ResponseFormat::Markdown, 100);
        assert_eq!(md.text, "| id |\n|---|");
        assert!(!md.truncated);

        let js = render(&result, ResponseFormat::Json, 100);
        assert_eq!(js.text, "[]");
        assert_eq!(js.total_rows, 0);
    }

    #[test]
    fn test_render_is_deterministic() {
        for format in [ResponseFormat::Markdown, ResponseFormat::Json] {
            for limit in [20, 60, 10_000] {
                assert_eq!(render(&sample(), format, limit), render(&sample(), format, limit));
            }
        }
    }

    #[test]
    fn test_exact_fit_not_truncated() {
        let full = render(&sample(), ResponseFormat::Markdown, 10_000);
        let len = full.text.chars().count();

        let exact = render(&sample(), ResponseFormat::Markdown, len);
        assert!(!exact.truncated);
        assert_eq!(exact.text, full.text);

        let short = render(&sample(), ResponseFormat::Markdown, len - 1);
        assert!(short.truncated);
        assert_eq!(short.rows_shown, 2);
    }

    #[test]
    fn test_truncation_keeps_maximal_prefix() {
        let result = sample();
        for format in [ResponseFormat::Markdown, ResponseFormat::Json] {
            let full_len = render(&result, format, usize::MAX).text.chars().count();
            for limit in 1..full_len {
                let out = render(&result, format, limit);
                assert!(out.truncated, "limit {}", limit);

                // Prefix of rows_shown fits, one more would not
                let fits = |k: usize| {
                    let prefix = QueryResult::new(result.columns.clone(), result.rows[..k].to_vec());
                    render(&prefix, format, usize::MAX).text.chars().count() <= limit
                };
                if out.rows_shown > 0 {
                    assert!(fits(out.rows_shown), "limit {}", limit);
                }
                assert!(!fits(out.rows_shown + 1), "limit {}", limit);
            }
        }
    }

    #[test]
    fn test_truncation_notice() {
        let out = render(&sample(), ResponseFormat::Markdown, 60);
        assert!(out.truncated);
        assert_eq!(out.rows_shown, 1);
        assert!(out.text.starts_with("| id | name | score |"));
        assert!(out.text.ends_with(
            "[Showing 1 of 3 rows; output truncated to fit the 60-character limit. \
             Add a LIMIT or WHERE clause to narrow the result.]"
        ));
    }

    #[test]
    fn test_header_over_budget_yields_notice_only() {
        let out = render(&sample(), ResponseFormat::Markdown, 5);
        assert!(out.truncated);
        assert_eq!(out.rows_shown, 0);
        assert!(out.text.starts_with("[Showing 0 of 3 rows"));
    }

    #[test]
    fn test_budget_counts_characters_not_bytes() {
        let result = QueryResult::new(vec!["w".into()], vec![vec![json!("ééé")]]);
        let full = render(&result, ResponseFormat::Markdown, usize::MAX);
        let chars = full.text.chars().count();
        assert!(full.text.len() > chars);
        assert!(!render(&result, ResponseFormat::Markdown, chars).truncated);
    }

    #[test]
    fn test_duplicate_columns_get_distinct_keys() {
        let result = QueryResult::new(
            vec!["a".into(), "a".into(), "a_2".into(), "a".into()],
            vec![vec![json!(1), json!(2), json!(3), json!(4)]],
        );
        let out = render(&result, ResponseFormat::Json, 10_000);
        let parsed: Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(parsed, json!([{"a": 1, "a_3": 2, "a_2": 3, "a_4": 4}]));

        // Markdown keeps the names as returned
        let md = render(&result, ResponseFormat::Markdown, 10_000);
        assert!(md.text.starts_with("| a | a | a_2 | a |"));
    }

    #[test]
    fn test_response_format_serde() {
        let f: ResponseFormat = serde_json::from_value(json!("json")).unwrap();
        assert_eq!(f, ResponseFormat::Json);
        assert_eq!(ResponseFormat::default(), ResponseFormat::Markdown);
        assert!(serde_json::from_value::<ResponseFormat>(json!("xml")).is_err());
    }
}
