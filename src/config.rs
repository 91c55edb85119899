//! Validator configuration.
//!
//! ```yaml
//! draft: draft-07        # or draft-04
//! meta_schema: { ... }   # optional; replaces the embedded document
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ParseError, SchemaError};
use crate::parse::{yaml_error, yaml_options};
use crate::schema::{Draft, MetaSchema};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Draft whose keyword semantics apply, and whose embedded meta-schema
    /// is used unless `meta_schema` is set.
    #[serde(default)]
    pub draft: Draft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_schema: Option<Value>,
}

impl ValidatorConfig {
    pub fn for_draft(draft: Draft) -> Self {
        ValidatorConfig {
            draft,
            meta_schema: None,
        }
    }

    /// Reads a configuration from YAML (or JSON) text.
    pub fn from_yaml(input: &str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str_with_options(input, yaml_options()).map_err(yaml_error)
    }

    /// Compiles the configured meta-schema.
    pub fn meta_schema(&self) -> Result<MetaSchema, SchemaError> {
        match &self.meta_schema {
            Some(document) => MetaSchema::from_value(document, self.draft),
            None => MetaSchema::for_draft(self.draft),
        }
    }
}
