use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::*;

/// Response timeout applied when a definition does not set one.
pub const DEFAULT_RESPONSE_TIMEOUT_SECONDS: i64 = 3600;

/// Retry count applied when a definition does not set one.
pub const DEFAULT_RETRY_COUNT: i32 = 3;

/// Retry delay applied when a definition does not set one.
pub const DEFAULT_RETRY_DELAY_SECONDS: i32 = 60;

// ─── TaskDef ────────────────────────────────────────────────────────────────

/// Catalog metadata describing a unit of work: its timeouts, retries,
/// ownership and the shape of its input and output.
///
/// A `TaskDef` is plain data. Any combination of field values is
/// representable; admissibility is decided by
/// [`TaskDefValidator`](crate::validate::TaskDefValidator).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub retry_count: i32,
    pub timeout_seconds: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_keys: Vec<String>,
    pub timeout_policy: TimeoutPolicy,
    pub retry_logic: RetryLogic,
    pub retry_delay_seconds: i32,
    /// Explicit response timeout. When unset the definition runs with
    /// [`DEFAULT_RESPONSE_TIMEOUT_SECONDS`] and is exempt from the
    /// response-vs-overall timeout rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_timeout_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrent_exec_limit: Option<i32>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub input_template: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_frequency: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_frequency_in_seconds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_name_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_timeout_seconds: Option<i32>,
    pub backoff_scale_factor: i32,
    /// JSON Schema describing the task's input. Empty means undeclared.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub input_definition: Map<String, Value>,
    /// JSON Schema describing the task's output. Empty means undeclared.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub output_definition: Map<String, Value>,
}

impl Default for TaskDef {
    fn default() -> Self {
        TaskDef {
            name: None,
            description: None,
            retry_count: DEFAULT_RETRY_COUNT,
            timeout_seconds: 0,
            input_keys: Vec::new(),
            output_keys: Vec::new(),
            timeout_policy: TimeoutPolicy::default(),
            retry_logic: RetryLogic::default(),
            retry_delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
            response_timeout_seconds: None,
            concurrent_exec_limit: None,
            input_template: Map::new(),
            rate_limit_per_frequency: None,
            rate_limit_frequency_in_seconds: None,
            isolation_group_id: None,
            execution_name_space: None,
            owner_email: None,
            poll_timeout_seconds: None,
            backoff_scale_factor: 1,
            input_definition: Map::new(),
            output_definition: Map::new(),
        }
    }
}

impl TaskDef {
    /// Builds a definition from the four commonly supplied fields.
    ///
    /// The response timeout is left unset, so it resolves to
    /// [`DEFAULT_RESPONSE_TIMEOUT_SECONDS`].
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        retry_count: i32,
        timeout_seconds: i64,
    ) -> Self {
        TaskDef {
            name: Some(name.into()),
            description: Some(description.into()),
            retry_count,
            timeout_seconds,
            ..TaskDef::default()
        }
    }

    /// Builds a definition carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        TaskDef {
            name: Some(name.into()),
            ..TaskDef::default()
        }
    }

    /// Effective response timeout.
    pub fn response_timeout_seconds(&self) -> i64 {
        self.response_timeout_seconds
            .unwrap_or(DEFAULT_RESPONSE_TIMEOUT_SECONDS)
    }

    /// Maximum number of concurrently running instances; 0 means unbounded.
    pub fn concurrency_limit(&self) -> i32 {
        self.concurrent_exec_limit.unwrap_or(0)
    }

    /// `(per_frequency, frequency_in_seconds)` when both rate limit fields are set.
    pub fn rate_limit(&self) -> Option<(i32, i32)> {
        match (
            self.rate_limit_per_frequency,
            self.rate_limit_frequency_in_seconds,
        ) {
            (Some(per), Some(secs)) => Some((per, secs)),
            _ => None,
        }
    }
}
