use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;
use taskdef_validate::{TaskDef, TaskDefValidator};

static VALIDATOR: LazyLock<TaskDefValidator> =
    LazyLock::new(|| TaskDefValidator::new().expect("embedded meta-schema must load"));

const CROSS_FIELD_MARKER: &str = "responseTimeoutSeconds:";

fn arb_owner() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("owner@example.com".to_string())),
        Just(Some("not an email".to_string())),
        "[a-z]{1,8}@[a-z]{1,8}\\.com".prop_map(Some),
    ]
}

fn arb_definition() -> impl Strategy<Value = Map<String, Value>> {
    prop_oneof![
        Just(Value::Object(Map::new())),
        Just(json!({ "type": "object" })),
        Just(json!({ "type": "unknown type" })),
        Just(json!({ "minLength": -1 })),
        Just(json!({ "required": ["a", "a"] })),
    ]
    .prop_map(|v| match v {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

fn arb_task() -> impl Strategy<Value = TaskDef> {
    (
        proptest::option::of("[a-z_]{0,12}"),
        any::<i32>(),
        -10i64..10_000,
        proptest::option::of(-10i64..10_000),
        arb_owner(),
        proptest::option::of(-5i32..5),
        -3i32..4,
        arb_definition(),
        arb_definition(),
    )
        .prop_map(
            |(name, retries, timeout, response, owner, poll, backoff, input, output)| TaskDef {
                name,
                retry_count: retries,
                timeout_seconds: timeout,
                response_timeout_seconds: response,
                owner_email: owner,
                poll_timeout_seconds: poll,
                backoff_scale_factor: backoff,
                input_definition: input,
                output_definition: output,
                ..TaskDef::default()
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Same record, same report; the record is never touched.
    #[test]
    fn validation_is_deterministic_and_pure(task in arb_task()) {
        let before = task.clone();
        let first = VALIDATOR.validate(&task);
        let second = VALIDATOR.validate(&task);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&task, &before);
    }

    // The cross-field rule fires exactly when an explicit response timeout
    // is not below the overall timeout.
    #[test]
    fn cross_field_rule_fires_iff_response_not_below_timeout(task in arb_task()) {
        let report = VALIDATOR.validate(&task);
        let fired = report
            .iter()
            .any(|v| v.field.is_none() && v.message.contains(CROSS_FIELD_MARKER));
        let expected = task
            .response_timeout_seconds
            .is_some_and(|r| r >= task.timeout_seconds);
        prop_assert_eq!(fired, expected);
    }

    // Any negative retry count yields the one literal message.
    #[test]
    fn retry_count_message_is_constant(retries in i32::MIN..0) {
        let mut task = TaskDef::named("retry");
        task.retry_count = retries;
        let report = VALIDATOR.validate(&task);
        let retry_messages: Vec<String> = report
            .for_field("retryCount")
            .map(|v| v.message.clone())
            .collect();
        prop_assert_eq!(retry_messages, vec!["TaskDef retryCount: 0 must be >= 0".to_string()]);
    }

    // Record findings come first, then input, then output.
    #[test]
    fn findings_are_grouped_by_layer(task in arb_task()) {
        let report = VALIDATOR.validate(&task);
        let rank = |field: Option<&str>| match field {
            Some("inputDefinition") => 1,
            Some("outputDefinition") => 2,
            _ => 0,
        };
        let ranks: Vec<u8> = report.iter().map(|v| rank(v.field.as_deref())).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        prop_assert_eq!(ranks, sorted);
    }

    // Valid records stay valid regardless of fields no rule looks at.
    #[test]
    fn unchecked_fields_never_add_findings(
        description in proptest::option::of(".{0,20}"),
        keys in proptest::collection::vec("[a-z]{1,5}", 0..4),
        limit in proptest::option::of(any::<i32>()),
    ) {
        let mut task = TaskDef::named("steady");
        task.timeout_seconds = 100;
        task.response_timeout_seconds = Some(10);
        task.owner_email = Some("steady@example.com".to_string());
        task.description = description;
        task.input_keys = keys;
        task.concurrent_exec_limit = limit;
        prop_assert!(VALIDATOR.validate(&task).is_valid());
    }
}
