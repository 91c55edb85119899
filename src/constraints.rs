//! Record-level rules for [`TaskDef`].
//!
//! Each rule is a plain function of the whole record that appends zero or
//! more violations. The orchestrator walks the static tables below; rules
//! never see each other's output.
//!
//! Minimum-bound messages embed the rule's bound, not the offending value
//! (`TaskDef retryCount: 0 must be >= 0` for any negative count).

use crate::email::is_valid_email;
use crate::report::Violation;
use crate::types::TaskDef;

/// A named record rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub check: fn(&TaskDef, &mut Vec<Violation>),
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Rules attributable to a single field.
pub static FIELD_RULES: &[Rule] = &[
    Rule {
        name: "name_required",
        check: name_required,
    },
    Rule {
        name: "retry_count_min",
        check: retry_count_min,
    },
    Rule {
        name: "owner_email_required",
        check: owner_email_required,
    },
    Rule {
        name: "owner_email_format",
        check: owner_email_format,
    },
    Rule {
        name: "poll_timeout_min",
        check: poll_timeout_min,
    },
    Rule {
        name: "backoff_scale_factor_min",
        check: backoff_scale_factor_min,
    },
];

/// Rules relating two fields of the same record.
pub static CROSS_FIELD_RULES: &[Rule] = &[Rule {
    name: "response_timeout_below_timeout",
    check: response_timeout_below_timeout,
}];

/// Runs every field and cross-field rule against `task`.
pub fn check_record(task: &TaskDef) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rule in FIELD_RULES.iter().chain(CROSS_FIELD_RULES) {
        let before = violations.len();
        (rule.check)(task, &mut violations);
        if violations.len() > before {
            tracing::trace!(rule = rule.name, fired = violations.len() - before, "rule fired");
        }
    }
    violations
}

fn min_bound(field: &str, bound: i64) -> Violation {
    Violation::on_field(
        field,
        format!("TaskDef {}: {} must be >= {}", field, bound, bound),
    )
}

// ─── Field rules ────────────────────────────────────────────────────────────

fn name_required(task: &TaskDef, out: &mut Vec<Violation>) {
    if task.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        out.push(Violation::on_field(
            "name",
            "TaskDef name cannot be null or empty",
        ));
    }
}

fn retry_count_min(task: &TaskDef, out: &mut Vec<Violation>) {
    if task.retry_count < 0 {
        out.push(min_bound("retryCount", 0));
    }
}

fn owner_email_required(task: &TaskDef, out: &mut Vec<Violation>) {
    if task.owner_email.as_deref().is_none_or(str::is_empty) {
        out.push(Violation::on_field("ownerEmail", "ownerEmail cannot be empty"));
    }
}

/// Empty addresses are left to [`owner_email_required`].
fn owner_email_format(task: &TaskDef, out: &mut Vec<Violation>) {
    if let Some(email) = task.owner_email.as_deref()
        && !email.is_empty()
        && !is_valid_email(email)
    {
        out.push(Violation::on_field(
            "ownerEmail",
            "ownerEmail should be valid email address",
        ));
    }
}

fn poll_timeout_min(task: &TaskDef, out: &mut Vec<Violation>) {
    if task.poll_timeout_seconds.is_some_and(|secs| secs < 0) {
        out.push(min_bound("pollTimeoutSeconds", 0));
    }
}

fn backoff_scale_factor_min(task: &TaskDef, out: &mut Vec<Violation>) {
    if task.backoff_scale_factor < 1 {
        out.push(min_bound("backoffScaleFactor", 1));
    }
}

// ─── Cross-field rules ──────────────────────────────────────────────────────

/// An explicit response timeout must be strictly below the overall timeout.
fn response_timeout_below_timeout(task: &TaskDef, out: &mut Vec<Violation>) {
    let Some(response_timeout) = task.response_timeout_seconds else {
        return;
    };
    if response_timeout >= task.timeout_seconds {
        out.push(Violation::record(format!(
            "TaskDef: {} responseTimeoutSeconds: {} must be less than timeoutSeconds: {}",
            task.name.as_deref().unwrap_or("null"),
            response_timeout,
            task.timeout_seconds
        )));
    }
}
