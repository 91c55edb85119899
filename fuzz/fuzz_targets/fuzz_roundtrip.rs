#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    let task = match taskdef_validate::parse(&s) {
        Ok(t) => t,
        Err(_) => return,
    };

    let yaml = match taskdef_validate::serialize(&task) {
        Ok(y) => y,
        Err(_) => return,
    };

    // A serialized record must parse back to the same record.
    match taskdef_validate::parse(&yaml) {
        Ok(reparsed) => assert_eq!(
            reparsed,
            task,
            "Roundtrip changed the record.\nSerialized YAML:\n{}",
            yaml.get(..500).unwrap_or(&yaml),
        ),
        Err(e) => panic!(
            "Roundtrip failure: serialize produced YAML that cannot be re-parsed: {}\n\
             Input (lossy): {:?}\n\
             Serialized YAML:\n{}",
            e,
            s.get(..200).unwrap_or(&s),
            yaml.get(..500).unwrap_or(&yaml),
        ),
    }
});
