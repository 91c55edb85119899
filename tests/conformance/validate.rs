use super::common::*;
use serde_json::json;
use taskdef_validate::{DEFAULT_RESPONSE_TIMEOUT_SECONDS, TaskDef, validate};

// ─── Convenience constructor ────────────────────────────────────────────────

#[test]
fn four_argument_constructor_defaults_response_timeout() {
    let def = TaskDef::new("test1", "desc", 10, 100);
    assert_eq!(def.response_timeout_seconds(), 3600);
    assert_eq!(def.response_timeout_seconds(), DEFAULT_RESPONSE_TIMEOUT_SECONDS);
    assert_eq!(def.name.as_deref(), Some("test1"));
    assert_eq!(def.description.as_deref(), Some("desc"));
    assert_eq!(def.retry_count, 10);
    assert_eq!(def.timeout_seconds, 100);

    let report = validator().validate(&def);
    assert!(
        !report
            .iter()
            .any(|v| v.message.contains("responseTimeoutSeconds")),
        "default response timeout must not trip the cross-field rule: {:?}",
        report
    );
}

// ─── Record rules ───────────────────────────────────────────────────────────

#[test]
fn negative_retries_bad_timeouts_and_missing_owner() {
    let mut task = TaskDef::named("task1");
    task.retry_count = -1;
    task.timeout_seconds = 1000;
    task.response_timeout_seconds = Some(1001);

    let report = validator().validate(&task);
    assert_eq!(report.len(), 3, "{:?}", report.messages());
    assert!(report.contains(
        "TaskDef: task1 responseTimeoutSeconds: 1001 must be less than timeoutSeconds: 1000"
    ));
    assert!(report.contains("TaskDef retryCount: 0 must be >= 0"));
    assert!(report.contains("ownerEmail cannot be empty"));
}

#[test]
fn name_and_owner_not_set() {
    let mut task = TaskDef::default();
    task.retry_count = -1;
    task.timeout_seconds = 1000;
    task.response_timeout_seconds = Some(1);

    let report = validator().validate(&task);
    assert_eq!(report.len(), 3, "{:?}", report.messages());
    assert!(report.contains("TaskDef retryCount: 0 must be >= 0"));
    assert!(report.contains("TaskDef name cannot be null or empty"));
    assert!(report.contains("ownerEmail cannot be empty"));
}

#[test]
fn invalid_owner_email() {
    let mut task = valid_task();
    task.owner_email = Some("owner".to_string());

    let report = validator().validate(&task);
    assert_eq!(report.messages(), vec!["ownerEmail should be valid email address"]);
}

#[test]
fn valid_owner_email() {
    let report = validator().validate(&valid_task());
    assert!(report.is_valid(), "{:?}", report.messages());
    assert!(report.is_empty());
}

// ─── Definitions ────────────────────────────────────────────────────────────

#[test]
fn well_formed_input_and_output_definitions() {
    let definition = definition(json!({
        "properties": {
            "name": { "type": "string", "minLength": 1 }
        }
    }));
    let mut task = valid_task();
    task.input_definition = definition.clone();
    task.output_definition = definition;

    let report = validator().validate(&task);
    assert!(report.is_valid(), "{:?}", report.messages());
}

#[test]
fn malformed_input_and_output_definitions() {
    let definition = definition(json!({ "title": "invalid", "type": "unknown type" }));
    let mut task = valid_task();
    task.input_definition = definition.clone();
    task.output_definition = definition;

    let report = validator().validate(&task);
    assert_eq!(report.len(), 6, "{:?}", report.messages());
    assert!(report.contains("#: expected type: Boolean, found: JSONObject"));
    assert!(report.contains("#/type: unknown type is not a valid enum value"));
    assert!(report.contains("#/type: expected type: JSONArray, found: String"));

    assert_eq!(report.for_field("inputDefinition").count(), 3);
    assert_eq!(report.for_field("outputDefinition").count(), 3);
}

#[test]
fn malformed_definition_findings_follow_meta_schema_order() {
    let mut task = valid_task();
    task.input_definition = definition(json!({ "title": "invalid", "type": "unknown type" }));

    let report = validator().validate(&task);
    assert_eq!(
        report.messages(),
        vec![
            "#/type: unknown type is not a valid enum value",
            "#/type: expected type: JSONArray, found: String",
            "#: expected type: Boolean, found: JSONObject",
        ]
    );
}

#[test]
fn every_layer_reports_in_one_pass() {
    let mut task = TaskDef::default();
    task.retry_count = -2;
    task.timeout_seconds = 10;
    task.response_timeout_seconds = Some(10);
    task.owner_email = Some("not an email".to_string());
    task.input_definition = definition(json!({ "type": "unknown type" }));

    let report = validator().validate(&task);
    assert_eq!(
        sorted_messages(&report),
        vec![
            "#/type: expected type: JSONArray, found: String",
            "#/type: unknown type is not a valid enum value",
            "#: expected type: Boolean, found: JSONObject",
            "TaskDef name cannot be null or empty",
            "TaskDef retryCount: 0 must be >= 0",
            "TaskDef: null responseTimeoutSeconds: 10 must be less than timeoutSeconds: 10",
            "ownerEmail should be valid email address",
        ]
    );
}

#[test]
fn shared_validator_matches_explicit_validator() {
    let mut task = valid_task();
    task.retry_count = -1;
    let shared = validate(&task).expect("embedded meta-schema must load");
    assert_eq!(shared, validator().validate(&task));
}

#[test]
fn validation_is_idempotent_and_side_effect_free() {
    let mut task = valid_task();
    task.owner_email = None;
    task.input_definition = definition(json!({ "type": "unknown type" }));
    let before = task.clone();

    let v = validator();
    let first = v.validate(&task);
    let second = v.validate(&task);
    assert_eq!(first, second);
    assert_eq!(task, before);
}
