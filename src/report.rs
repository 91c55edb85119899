//! Violations and the report that aggregates them.
//!
//! A report is built by appending; nothing is ever deduplicated, reordered
//! or dropped, and a report of any size is a normal result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Violation severity. Every rule in this crate produces hard errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Severity {
    #[default]
    Error,
}

/// One located failure of one constraint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// The TaskDef field (wire name) the finding is attributed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// JSON pointer into a nested document, `#`-rooted. Empty for record-level findings.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub path: String,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

impl Violation {
    /// A record-level finding attributed to `field`.
    pub fn on_field(field: &str, message: impl Into<String>) -> Self {
        Violation {
            field: Some(field.to_string()),
            path: String::new(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// A record-level finding spanning several fields.
    pub fn record(message: impl Into<String>) -> Self {
        Violation {
            field: None,
            path: String::new(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// A finding located inside a nested document.
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            field: None,
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Attributes the finding to `field`, keeping its path.
    pub fn in_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Ordered collection of every violation found in one validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// `true` when no constraint fired; the only signal of acceptance.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Violations attributed to `field`, in report order.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations
            .iter()
            .filter(move |v| v.field.as_deref() == Some(field))
    }

    /// Rendered violations (`path: message`, or `message` alone), in report order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// `true` if any violation renders exactly as `message`.
    pub fn contains(&self, message: &str) -> bool {
        self.violations.iter().any(|v| v.to_string() == message)
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl Extend<Violation> for ValidationReport {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        self.violations.extend(iter);
    }
}

impl FromIterator<Violation> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        ValidationReport {
            violations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValidationReport {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}
