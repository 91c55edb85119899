use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use taskdef_validate::parse::parse_all;
use taskdef_validate::{
    MAX_NESTING_DEPTH, ParseErrorKind, RetryLogic, TaskDef, TimeoutPolicy, parse,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/parse")
}

fn yaml_fixtures(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("yaml"))
        .collect();
    paths.sort();
    paths
}

// ─── Fixture sweep ──────────────────────────────────────────────────────────

#[test]
fn parse_valid_fixtures() {
    let paths = yaml_fixtures(&fixtures_dir().join("valid"));
    assert!(!paths.is_empty(), "no valid parse fixtures found");
    for path in paths {
        let content = fs::read_to_string(&path).unwrap();
        let result = parse(&content);
        assert!(
            result.is_ok(),
            "Expected valid parse for {:?}, got error: {:?}",
            path.file_name().unwrap(),
            result.err()
        );
    }
}

#[test]
fn parse_invalid_fixtures() {
    let paths = yaml_fixtures(&fixtures_dir().join("invalid"));
    assert!(!paths.is_empty(), "no invalid parse fixtures found");
    for path in paths {
        let content = fs::read_to_string(&path).unwrap();
        let result = parse(&content);
        assert!(
            result.is_err(),
            "Expected parse error for {:?}, got: {:?}",
            path.file_name().unwrap(),
            result.ok()
        );
    }
}

// ─── Field mapping ──────────────────────────────────────────────────────────

#[test]
fn minimal_document_takes_defaults() {
    let task = parse("name: send_email\n").unwrap();
    assert_eq!(task, TaskDef::named("send_email"));
    assert_eq!(task.retry_count, 3);
    assert_eq!(task.retry_delay_seconds, 60);
    assert_eq!(task.backoff_scale_factor, 1);
    assert_eq!(task.timeout_policy, TimeoutPolicy::TimeOutWf);
    assert_eq!(task.retry_logic, RetryLogic::Fixed);
    assert_eq!(task.response_timeout_seconds, None);
    assert_eq!(task.response_timeout_seconds(), 3600);
    assert!(task.input_definition.is_empty());
}

#[test]
fn camel_case_fields_map_onto_the_record() {
    let content = fs::read_to_string(fixtures_dir().join("valid/full.yaml")).unwrap();
    let task = parse(&content).unwrap();

    assert_eq!(task.name.as_deref(), Some("encode_video"));
    assert_eq!(task.retry_count, 5);
    assert_eq!(task.timeout_seconds, 3600);
    assert_eq!(task.input_keys, vec!["sourceUrl", "profile"]);
    assert_eq!(task.output_keys, vec!["manifestUrl"]);
    assert_eq!(task.timeout_policy, TimeoutPolicy::Retry);
    assert_eq!(task.retry_logic, RetryLogic::ExponentialBackoff);
    assert_eq!(task.retry_delay_seconds, 30);
    assert_eq!(task.response_timeout_seconds, Some(600));
    assert_eq!(task.concurrency_limit(), 10);
    assert_eq!(task.input_template.get("profile"), Some(&json!("hd")));
    assert_eq!(task.rate_limit(), Some((100, 60)));
    assert_eq!(task.isolation_group_id.as_deref(), Some("media"));
    assert_eq!(task.execution_name_space.as_deref(), Some("encoding"));
    assert_eq!(task.owner_email.as_deref(), Some("media-team@example.com"));
    assert_eq!(task.poll_timeout_seconds, Some(30));
    assert_eq!(task.backoff_scale_factor, 2);
    assert_eq!(
        task.input_definition.get("required"),
        Some(&json!(["sourceUrl"]))
    );
    assert_eq!(
        task.output_definition.get("type"),
        Some(&json!("object"))
    );
}

#[test]
fn definition_key_order_is_preserved() {
    let task = parse(
        "name: ordered\ninputDefinition:\n  zeta: 1\n  alpha: 2\n  mid: 3\n",
    )
    .unwrap();
    let keys: Vec<&str> = task.input_definition.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn explicit_nulls_mean_unset() {
    let task = parse("name: cleanup\nresponseTimeoutSeconds: null\nretryCount: ~\n").unwrap();
    assert_eq!(task.response_timeout_seconds, None);
    assert_eq!(task.retry_count, 3);
}

#[test]
fn json_text_is_accepted() {
    let task = parse(r#"{"name": "from_json", "timeoutSeconds": 60}"#).unwrap();
    assert_eq!(task.name.as_deref(), Some("from_json"));
    assert_eq!(task.timeout_seconds, 60);
}

#[test]
fn parsing_does_not_validate() {
    let task = parse("retryCount: -7\nownerEmail: nope\n").unwrap();
    assert_eq!(task.retry_count, -7);
    assert_eq!(task.name, None);
}

// ─── Error classification ───────────────────────────────────────────────────

#[test]
fn unknown_enum_value_is_unknown_variant() {
    let err = parse("name: x\nretryLogic: RANDOM_BACKOFF\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnknownVariant, "{}", err);
}

#[test]
fn wrong_scalar_kind_is_type_mismatch() {
    let err = parse("name: x\nretryCount: many\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TypeMismatch, "{}", err);
}

#[test]
fn non_mapping_definition_is_type_mismatch_at_field() {
    let err = parse("name: x\ninputDefinition: \"{ type: object }\"\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TypeMismatch);
    assert_eq!(err.path.as_deref(), Some("inputDefinition"));

    let err = parse("name: x\noutputDefinition: [type, object]\n").unwrap_err();
    assert_eq!(err.path.as_deref(), Some("outputDefinition"));
}

#[test]
fn non_mapping_root_is_type_mismatch() {
    let err = parse("- name: a\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TypeMismatch);
}

#[test]
fn empty_input_is_syntax_error() {
    for input in ["", "   \n\t\n"] {
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.message, "empty input");
    }
}

/// `name` plus an `inputDefinition` of `levels` nested flow mappings.
fn nested_definition(levels: usize) -> String {
    let mut flow = String::from("{}");
    for _ in 0..levels {
        flow = format!("{{properties: {{a: {flow}}}}}");
    }
    format!("name: nested\ninputDefinition: {flow}\n")
}

#[test]
fn nesting_beyond_the_limit_is_syntax_error() {
    for levels in [MAX_NESTING_DEPTH, 120, 1000] {
        let err = parse(&nested_definition(levels)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax, "{}", err);
    }
}

#[test]
fn moderate_nesting_parses() {
    let task = parse(&nested_definition(20)).unwrap();
    let mut depth = 0;
    let mut cursor = task.input_definition.get("properties");
    while let Some(inner) = cursor.and_then(|p| p.get("a")) {
        depth += 1;
        cursor = inner.get("properties");
    }
    assert_eq!(depth, 20);
}

#[test]
fn multiple_documents_are_rejected() {
    let err = parse("---\nname: a\n---\nname: b\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("multi-document"));
}

#[test]
fn document_marker_inside_block_scalar_is_not_a_separator() {
    let task = parse("---\nname: a\ndescription: |\n  ---\n  still the description\n").unwrap();
    assert!(task.description.unwrap().contains("still the description"));
}

// ─── Sequences ──────────────────────────────────────────────────────────────

#[test]
fn parse_all_reads_a_sequence() {
    let tasks = parse_all("- name: a\n- name: b\n  retryCount: 0\n").unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].name.as_deref(), Some("a"));
    assert_eq!(tasks[1].retry_count, 0);
}

#[test]
fn parse_all_prefixes_errors_with_the_index() {
    let err = parse_all("- name: a\n- name: b\n  inputDefinition: 5\n").unwrap_err();
    assert_eq!(err.path.as_deref(), Some("[1].inputDefinition"));

    let err = parse_all("- name: a\n- just a string\n").unwrap_err();
    assert_eq!(err.path.as_deref(), Some("[1]"));

    let err = parse_all("name: a\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TypeMismatch);
}
