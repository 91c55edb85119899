#![no_main]

use std::sync::LazyLock;

use libfuzzer_sys::fuzz_target;
use taskdef_validate::{Draft, SchemaConformanceChecker};

static CHECKERS: LazyLock<Vec<SchemaConformanceChecker>> = LazyLock::new(|| {
    [Draft::Draft7, Draft::Draft4]
        .into_iter()
        .map(|draft| SchemaConformanceChecker::for_draft(draft).unwrap())
        .collect()
});

fuzz_target!(|data: &[u8]| {
    let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    for checker in CHECKERS.iter() {
        let first = checker.check(&document);
        let second = checker.check(&document);
        assert_eq!(first, second, "conformance check is not deterministic");
    }
});
