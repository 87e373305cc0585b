#![no_main]

use libfuzzer_sys::fuzz_target;
use sanitizer::{SanitizerConfig, sanitize};
use std::sync::LazyLock;

static CONFIG: LazyLock<SanitizerConfig> = LazyLock::new(SanitizerConfig::default);

fuzz_target!(|data: &[u8]| {
    let Ok(first) = sanitize(data, &CONFIG) else {
        assert!(std::str::from_utf8(data).is_err());
        return;
    };
    let second = sanitize(first.output.as_bytes(), &CONFIG).expect("output is utf-8");
    assert_eq!(second.output, first.output, "re-sanitizing changed the output");

    // Literal `<` only ever opens a tag the engine emitted, which never contains another one.
    let mut open = false;
    for b in first.output.bytes() {
        match b {
            b'<' => {
                assert!(!open, "nested literal <");
                open = true;
            }
            b'>' => {
                assert!(open, "literal > outside a tag");
                open = false;
            }
            _ => {}
        }
    }
    assert!(!open, "unterminated literal <");
});
