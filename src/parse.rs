use serde_json::Value;

use crate::conformance::MAX_NESTING_DEPTH;
use crate::error::{ParseError, ParseErrorKind};
use crate::types::TaskDef;

/// Parse a YAML (or JSON) string into an unvalidated TaskDef.
///
/// Performs deserialization and type mapping only; it does NOT apply any
/// validation rule. A definition document that is not a mapping is a parse
/// error, since no rule can reason about it.
pub fn parse(input: &str) -> Result<TaskDef, ParseError> {
    let value = parse_value(input)?;
    if !value.is_object() {
        return Err(ParseError::new(
            ParseErrorKind::TypeMismatch,
            "task definition must be a mapping",
        ));
    }
    from_value(value)
}

/// Parse a YAML (or JSON) sequence of task definitions.
pub fn parse_all(input: &str) -> Result<Vec<TaskDef>, ParseError> {
    let value = parse_value(input)?;
    let Value::Array(items) = value else {
        return Err(ParseError::new(
            ParseErrorKind::TypeMismatch,
            "expected a sequence of task definitions",
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(ParseError {
                    path: Some(format!("[{}]", i)),
                    ..ParseError::new(
                        ParseErrorKind::TypeMismatch,
                        "task definition must be a mapping",
                    )
                });
            }
            from_value(item).map_err(|e| ParseError {
                path: Some(match e.path {
                    Some(p) => format!("[{}].{}", i, p),
                    None => format!("[{}]", i),
                }),
                ..e
            })
        })
        .collect()
}

fn parse_value(input: &str) -> Result<Value, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::Syntax, "empty input"));
    }

    check_multi_document(input)?;

    serde_saphyr::from_str_with_options(input, yaml_options()).map_err(yaml_error)
}

/// Reader options shared by every YAML entry point. Nesting is capped so
/// that deserializing and walking a document stays within the stack.
pub(crate) fn yaml_options() -> serde_saphyr::Options {
    serde_saphyr::Options {
        budget: Some(serde_saphyr::Budget {
            max_depth: MAX_NESTING_DEPTH,
            ..serde_saphyr::Budget::default()
        }),
        ..serde_saphyr::Options::default()
    }
}

pub(crate) fn yaml_error(e: serde_saphyr::Error) -> ParseError {
    let msg = e.to_string();
    let kind = match e {
        serde_saphyr::Error::Budget { .. } => ParseErrorKind::Syntax,
        _ => classify_saphyr_error(&msg),
    };
    ParseError::new(kind, msg)
}

fn from_value(mut value: Value) -> Result<TaskDef, ParseError> {
    if let Value::Object(map) = &mut value {
        // Explicit nulls mean "unset".
        map.retain(|_, v| !v.is_null());
        for field in ["inputDefinition", "outputDefinition", "inputTemplate"] {
            if map.get(field).is_some_and(|v| !v.is_object()) {
                return Err(ParseError {
                    path: Some(field.to_string()),
                    ..ParseError::new(
                        ParseErrorKind::TypeMismatch,
                        format!("{} must be a mapping", field),
                    )
                });
            }
        }
    }

    serde_json::from_value(value).map_err(|e| {
        let msg = e.to_string();
        ParseError::new(classify_json_error(&msg), msg)
    })
}

/// Check for multiple YAML documents (--- separator).
/// Only matches `---` at column 0 to avoid false positives inside block scalars.
fn check_multi_document(input: &str) -> Result<(), ParseError> {
    let mut doc_count = 0;
    for line in input.lines() {
        // Document markers only count at column 0
        if line.starts_with("---") && line[3..].trim().is_empty() {
            doc_count += 1;
            if doc_count > 1 {
                return Err(ParseError::new(
                    ParseErrorKind::Syntax,
                    "multi-document YAML is not supported",
                ));
            }
        }
    }
    Ok(())
}

fn classify_saphyr_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown") || lower.contains("variant") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("type") || lower.contains("invalid") || lower.contains("expected") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}

fn classify_json_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown variant") || lower.contains("unknown field") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("missing field") || lower.contains("invalid type") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
