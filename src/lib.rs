//! Admission validation for workflow task definitions.
//!
//! A [`TaskDef`] describes a unit of work in a workflow catalog: its
//! timeouts, retries, owner and the JSON Schema contracts of its input and
//! output. Before such a record is stored or referenced it must pass three
//! layers of checks:
//!
//! ```text
//! field rules        name, retryCount, ownerEmail, ...
//! cross-field rule   responseTimeoutSeconds < timeoutSeconds
//! conformance        inputDefinition / outputDefinition vs. the JSON Schema meta-schema
//! ```
//!
//! Every layer runs on every call and all findings land in one
//! [`ValidationReport`]. A non-empty report is the rejection signal; the
//! validator never fails because a record is invalid.
//!
//! # Quick Start
//!
//! ```rust
//! use taskdef_validate::{TaskDef, TaskDefValidator};
//!
//! let mut task = TaskDef::new("encode_video", "transcode an upload", 3, 600);
//! task.owner_email = Some("media-team@example.com".to_string());
//! task.response_timeout_seconds = Some(60);
//!
//! let validator = TaskDefValidator::new().expect("embedded meta-schema loads");
//! let report = validator.validate(&task);
//! assert!(report.is_valid(), "{}", report);
//! ```

pub mod config;
pub mod conformance;
pub mod constraints;
pub mod email;
pub mod enums;
pub mod error;
pub mod parse;
pub mod report;
pub mod schema;
pub mod serialize;
pub mod types;
pub mod validate;

pub use config::ValidatorConfig;
pub use conformance::{MAX_NESTING_DEPTH, SchemaConformanceChecker};
pub use enums::*;
pub use error::*;
pub use report::{Severity, ValidationReport, Violation};
pub use schema::{Draft, MetaSchema};
pub use types::*;
pub use validate::TaskDefValidator;

// Re-export entry-point functions at the crate root for convenience.
pub use parse::parse;
pub use serialize::serialize;
pub use validate::validate;

/// Convenience entry point composing parse → validate.
///
/// Returns the record only when it produced no violations.
///
/// # Errors
///
/// [`LoadError::Parse`] if the text is not a task definition,
/// [`LoadError::Schema`] if the embedded meta-schema cannot be loaded, and
/// [`LoadError::Invalid`] carrying the full report otherwise.
///
/// # Example
///
/// ```rust
/// let yaml = r#"
/// name: resize_image
/// retryCount: 2
/// timeoutSeconds: 300
/// responseTimeoutSeconds: 30
/// ownerEmail: images@example.com
/// inputDefinition:
///   type: object
///   required: [url]
/// "#;
///
/// match taskdef_validate::load(yaml) {
///     Ok(task) => println!("accepted {:?}", task.name),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn load(input: &str) -> Result<TaskDef, LoadError> {
    let task = parse::parse(input)?;
    let report = validate::validate(&task)?;
    if !report.is_valid() {
        return Err(LoadError::Invalid(report));
    }
    Ok(task)
}
