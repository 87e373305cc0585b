#![no_main]

use libfuzzer_sys::fuzz_target;
use sanitizer::{CommentPolicy, SanitizerConfig, sanitize};
use std::sync::LazyLock;

static CONFIG: LazyLock<SanitizerConfig> = LazyLock::new(|| SanitizerConfig {
    comments: CommentPolicy::Retain,
    ..SanitizerConfig::default()
});

fuzz_target!(|data: &[u8]| {
    if let Ok(first) = sanitize(data, &CONFIG) {
        let second = sanitize(first.output.as_bytes(), &CONFIG).expect("output is utf-8");
        assert_eq!(second.output, first.output, "re-sanitizing changed the output");
    }
});
