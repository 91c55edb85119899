#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    // Whatever parses must validate without panicking.
    if let Ok(task) = taskdef_validate::parse(&s) {
        let _ = taskdef_validate::validate(&task);
    }
});
