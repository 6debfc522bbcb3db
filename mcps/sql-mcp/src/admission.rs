//! Read-only query admission
//!
//! [`admit`] decides whether a raw SQL string may be executed. A query is
//! admitted when it is a single statement that starts with `SELECT` and
//! contains none of the mutating keywords in [`DISALLOWED_KEYWORDS`] as a
//! standalone word.
//!
//! This is a textual heuristic, not a SQL parser, and not a security
//! boundary. It does not look inside the statement's structure:
//!
//! - keywords inside comments or string literals still cause a denial;
//! - a `;` inside a string literal is treated as a statement separator;
//! - a `SELECT` that calls a function with side effects is admitted.
//!
//! Pair it with database-level permissions when writes must be impossible.

use std::sync::LazyLock;

use regex::Regex;

/// Keywords that deny a query wherever they appear as a whole word
pub const DISALLOWED_KEYWORDS: [&str; 9] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "TRUNCATE", "CREATE", "GRANT", "REVOKE",
];

static DISALLOWED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)\b(?:{})\b", DISALLOWED_KEYWORDS.join("|"));
    Regex::new(&pattern).expect("Invalid disallowed keyword regex")
});

static SELECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^SELECT\b").expect("Invalid select regex"));

/// Why a query was not admitted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionDenied {
    #[error("Query is empty. Provide a SELECT statement.")]
    Empty,

    #[error("Only SELECT queries are permitted. Query begins with '{0}'.")]
    NotSelect(String),

    #[error(
        "Destructive operations not allowed. Query contains '{0}'. \
         Only SELECT queries are permitted for safety."
    )]
    Keyword(&'static str),

    #[error("Multiple statements are not allowed. Submit a single SELECT statement.")]
    MultipleStatements,
}

/// Check a raw query against the read-only policy
///
/// Returns the statement to execute (the input with surrounding whitespace
/// removed, otherwise unchanged) or the reason for denial. A disallowed
/// keyword is reported in preference to any other violation.
pub fn admit(raw_query: &str) -> Result<&str, AdmissionDenied> {
    if let Some(hit) = DISALLOWED_REGEX.find(raw_query) {
        return Err(AdmissionDenied::Keyword(canonical_keyword(hit.as_str())));
    }

    let statement = raw_query.trim();
    if statement.is_empty() {
        return Err(AdmissionDenied::Empty);
    }

    if !SELECT_REGEX.is_match(statement) {
        return Err(AdmissionDenied::NotSelect(leading_word(statement)));
    }

    // A trailing terminator is fine; anything after an inner one is a second statement
    let body = statement.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if body.contains(';') {
        return Err(AdmissionDenied::MultipleStatements);
    }

    Ok(statement)
}

fn canonical_keyword(matched: &str) -> &'static str {
    DISALLOWED_KEYWORDS
        .iter()
        .find(|k| k.eq_ignore_ascii_case(matched))
        .copied()
        .unwrap_or("UNKNOWN")
}

fn leading_word(statement: &str) -> String {
    statement
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .take(32)
        .collect()
}
