//! Task definition validation.
//!
//! Returns **all** violations, not just the first. Validation does not
//! modify the record, and an invalid record is a normal result: the only
//! failure mode is a meta-schema that cannot be loaded, which surfaces when
//! the validator is built.

use std::sync::LazyLock;

use crate::config::ValidatorConfig;
use crate::conformance::SchemaConformanceChecker;
use crate::constraints::check_record;
use crate::error::SchemaError;
use crate::report::ValidationReport;
use crate::types::TaskDef;

static DEFAULT_VALIDATOR: LazyLock<Result<TaskDefValidator, SchemaError>> =
    LazyLock::new(TaskDefValidator::new);

/// Runs the record rules and the definition conformance checks against
/// task definitions. Cheap to clone; safe to share across threads.
#[derive(Clone, Debug)]
pub struct TaskDefValidator {
    checker: SchemaConformanceChecker,
}

impl TaskDefValidator {
    /// A validator over the embedded draft-07 meta-schema.
    pub fn new() -> Result<Self, SchemaError> {
        Self::with_config(&ValidatorConfig::default())
    }

    pub fn with_config(config: &ValidatorConfig) -> Result<Self, SchemaError> {
        let meta = config.meta_schema()?;
        Ok(Self::with_checker(SchemaConformanceChecker::new(meta)))
    }

    pub fn with_checker(checker: SchemaConformanceChecker) -> Self {
        TaskDefValidator { checker }
    }

    pub fn checker(&self) -> &SchemaConformanceChecker {
        &self.checker
    }

    /// Validates `task`, collecting field, cross-field and definition
    /// findings into one report.
    pub fn validate(&self, task: &TaskDef) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.extend(check_record(task));
        report.extend(
            self.checker
                .check_definition(&task.input_definition)
                .into_iter()
                .map(|v| v.in_field("inputDefinition")),
        );
        report.extend(
            self.checker
                .check_definition(&task.output_definition)
                .into_iter()
                .map(|v| v.in_field("outputDefinition")),
        );

        tracing::debug!(
            task = task.name.as_deref().unwrap_or_default(),
            violations = report.len(),
            "validated task definition"
        );
        report
    }
}

/// Validates `task` with the shared draft-07 validator, built on first use.
///
/// # Errors
///
/// Returns the [`SchemaError`] raised while loading the embedded
/// meta-schema. Findings about `task` itself are never errors.
pub fn validate(task: &TaskDef) -> Result<ValidationReport, SchemaError> {
    match &*DEFAULT_VALIDATOR {
        Ok(validator) => Ok(validator.validate(task)),
        Err(e) => Err(e.clone()),
    }
}
