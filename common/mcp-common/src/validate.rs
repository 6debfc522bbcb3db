//! Argument validation against a tool's declared input schema
//!
//! Checks an invocation before it is deserialized into the tool's parameter
//! struct, so failures can name the offending field. The schema itself is
//! enforced with [`jsonschema`], including `$ref`'d definitions such as enum
//! parameters. On top of it, an explicit `null` for a required argument
//! counts as missing.

use jsonschema::error::ValidationErrorKind;
use rmcp::model::JsonObject;
use serde_json::Value;

/// Reasons a tool invocation's arguments are rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required argument `{0}`")]
    Missing(String),

    #[error("unexpected argument `{0}`")]
    Unexpected(String),

    #[error("argument `{field}` {reason}")]
    Invalid { field: String, reason: String },

    #[error("arguments rejected: {0}")]
    Rejected(String),

    #[error("tool input schema does not compile: {0}")]
    Schema(String),
}

impl ValidationError {
    /// Build a value-level rejection for `field` (length, range, format)
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Field name for a JSON pointer such as `/response_format` or `/items/0`
fn field_name(pointer: &str) -> String {
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn from_schema_error(err: jsonschema::ValidationError<'_>) -> ValidationError {
    let pointer = err.instance_path.to_string();
    if !pointer.is_empty() {
        return ValidationError::invalid(field_name(&pointer), format!("is invalid: {}", err));
    }

    match &err.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } if !unexpected.is_empty() => {
            ValidationError::Unexpected(unexpected[0].clone())
        }
        ValidationErrorKind::Required { property } => {
            let name = property.as_str().map(str::to_string);
            ValidationError::Missing(name.unwrap_or_else(|| property.to_string()))
        }
        _ => ValidationError::Rejected(err.to_string()),
    }
}

/// Validate `args` against a tool input schema
///
/// A `null` argument object is treated as `{}`. Only the first violation is
/// reported.
pub fn validate_arguments(schema: &JsonObject, args: &Value) -> Result<(), ValidationError> {
    let args = match args {
        Value::Object(_) => args.clone(),
        Value::Null => Value::Object(serde_json::Map::new()),
        _ => return Err(ValidationError::NotAnObject),
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if args.get(name).map_or(true, Value::is_null) {
                return Err(ValidationError::Missing(name.to_string()));
            }
        }
    }

    let validator = jsonschema::validator_for(&Value::Object(schema.clone()))
        .map_err(|e| ValidationError::Schema(e.to_string()))?;

    let result = match validator.iter_errors(&args).next() {
        Some(err) => Err(from_schema_error(err)),
        None => Ok(()),
    };
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    fn add_schema() -> JsonObject {
        schema(json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" },
                "label": { "type": ["string", "null"] }
            },
            "required": ["a", "b"],
            "additionalProperties": false
        }))
    }

    /// Shape produced by schemars for a struct with a unit-enum field
    fn format_schema() -> JsonObject {
        schema(json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "response_format": {
                    "$ref": "#/$defs/ResponseFormat",
                    "default": "markdown"
                }
            },
            "required": ["query"],
            "additionalProperties": false,
            "$defs": {
                "ResponseFormat": {
                    "oneOf": [
                        { "type": "string", "const": "markdown" },
                        { "type": "string", "const": "json" }
                    ]
                }
            }
        }))
    }

    #[test]
    fn test_valid_arguments() {
        assert!(validate_arguments(&add_schema(), &json!({"a": 2, "b": 3.5})).is_ok());
        assert!(validate_arguments(&add_schema(), &json!({"a": 2, "b": 3, "label": null})).is_ok());
    }

    #[test]
    fn test_missing_required_names_field() {
        let err = validate_arguments(&add_schema(), &json!({"a": 2})).unwrap_err();
        assert_eq!(err, ValidationError::Missing("b".to_string()));
        assert!(err.to_string().contains("`b`"));
    }

    #[test]
    fn test_null_required_is_missing() {
        let err = validate_arguments(&add_schema(), &json!({"a": null, "b": 1})).unwrap_err();
        assert_eq!(err, ValidationError::Missing("a".to_string()));
    }

    #[test]
    fn test_wrong_type_names_field() {
        let err = validate_arguments(&add_schema(), &json!({"a": "two", "b": 3})).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { ref field, .. } if field == "a"));
        assert!(err.to_string().starts_with("argument `a` is invalid:"));
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let schema = schema(json!({
            "properties": { "limit": { "type": ["integer", "null"] } }
        }));
        assert!(validate_arguments(&schema, &json!({"limit": 5})).is_ok());
        assert!(validate_arguments(&schema, &json!({"limit": null})).is_ok());
        let err = validate_arguments(&schema, &json!({"limit": 2.5})).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { ref field, .. } if field == "limit"));
    }

    #[test]
    fn test_unexpected_argument_when_closed() {
        let err = validate_arguments(&add_schema(), &json!({"a": 1, "b": 2, "c": 3})).unwrap_err();
        assert_eq!(err, ValidationError::Unexpected("c".to_string()));
    }

    #[test]
    fn test_extra_argument_allowed_when_open() {
        let schema = schema(json!({ "properties": { "a": { "type": "string" } } }));
        assert!(validate_arguments(&schema, &json!({"a": "x", "zzz": 1})).is_ok());
    }

    #[test]
    fn test_null_arguments_treated_as_empty() {
        let schema = schema(json!({ "properties": {} }));
        assert!(validate_arguments(&schema, &Value::Null).is_ok());
        assert!(matches!(
            validate_arguments(&add_schema(), &Value::Null),
            Err(ValidationError::Missing(_))
        ));
    }

    #[test]
    fn test_non_object_arguments() {
        let err = validate_arguments(&add_schema(), &json!([1, 2])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject);
    }

    #[test]
    fn test_referenced_enum_checked() {
        let schema = format_schema();
        assert!(validate_arguments(&schema, &json!({"query": "q", "response_format": "json"})).is_ok());
        assert!(validate_arguments(&schema, &json!({"query": "q"})).is_ok());

        for bad in [json!("xml"), json!(7)] {
            let err = validate_arguments(&schema, &json!({"query": "q", "response_format": bad}))
                .unwrap_err();
            assert!(
                matches!(err, ValidationError::Invalid { ref field, .. } if field == "response_format"),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn test_nested_field_path() {
        let schema = schema(json!({
            "properties": {
                "filter": {
                    "type": "object",
                    "properties": { "column": { "type": "string" } }
                }
            }
        }));
        let err = validate_arguments(&schema, &json!({"filter": {"column": 1}})).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { ref field, .. } if field == "filter.column"));
    }

    #[test]
    fn test_field_name_unescapes_pointer() {
        assert_eq!(field_name("/response_format"), "response_format");
        assert_eq!(field_name("/a~1b/0"), "a/b.0");
    }
}
