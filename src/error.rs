use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::report::ValidationReport;

/// Error kind for parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    UnknownVariant,
}

/// Produced when task definition or configuration text cannot be
/// deserialized. This covers a definition document that is not a mapping
/// and input nested deeper than the reader accepts.
///
/// `Display` is written by hand because the location prefix is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            path: None,
            line: None,
            column: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{}:{}: {}", line, col, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Serialization error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SerializeError {
    pub message: String,
}

/// The meta-schema could not be loaded. Fatal: without a usable meta-schema
/// no definition document can be judged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("meta-schema is not valid JSON: {0}")]
    Parse(String),

    #[error("meta-schema node at '{pointer}' must be an object or a boolean")]
    MalformedNode { pointer: String },

    #[error("meta-schema keyword '{keyword}' at '{pointer}' is malformed: {reason}")]
    MalformedKeyword {
        pointer: String,
        keyword: String,
        reason: String,
    },

    #[error("unresolvable reference '{reference}' at '{pointer}'")]
    UnresolvedReference { pointer: String, reference: String },

    #[error("reference cycle through '{pointer}' never reaches a schema")]
    ReferenceCycle { pointer: String },
}

/// Combined error type for the [`load`](crate::load) entry point.
#[derive(Clone, Debug, Error)]
pub enum LoadError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("validator unavailable: {0}")]
    Schema(#[from] SchemaError),

    #[error("task definition rejected:\n{0}")]
    Invalid(ValidationReport),
}
