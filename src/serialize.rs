//! [`TaskDef`] → YAML serialization.

use crate::error::SerializeError;
use crate::types::TaskDef;

/// Serialize a TaskDef to a YAML string using wire (camelCase) field names.
///
/// Unset optional fields and empty collections are omitted, so the output
/// parses back to an equal record.
pub fn serialize(task: &TaskDef) -> Result<String, SerializeError> {
    // Convert to serde_json::Value first for consistent field ordering
    let value = serde_json::to_value(task).map_err(|e| SerializeError {
        message: format!("failed to convert task definition to JSON value: {}", e),
    })?;

    serde_saphyr::to_string(&value).map_err(|e| SerializeError {
        message: format!("failed to serialize to YAML: {}", e),
    })
}
