//! Closed enumerations used by the task definition model.
//!
//! Only the defined variants are valid; an unknown value is rejected at
//! parse time rather than reported as a violation.

use serde::{Deserialize, Serialize};

/// How a failed task is rescheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryLogic {
    #[default]
    Fixed,
    ExponentialBackoff,
    LinearBackoff,
}

/// What happens when a task exceeds `timeoutSeconds`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeoutPolicy {
    Retry,
    #[default]
    TimeOutWf,
    AlertOnly,
}

