//! Fixture loading and reporting helpers shared by the sanitizer integration tests.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::fs;
use std::path::Path;

pub const SANITIZE_CASES_FORMAT_V1: &str = "sanitize-cases-v1";

/// Escapes control characters, quotes and backslashes so a line of output can be shown
/// verbatim inside a failure message.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' || ch == '\u{7f}' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Line-oriented report of where `actual` first departs from `expected`, with two lines
/// of context on each side.
pub fn diff_lines(expected: &str, actual: &str) -> String {
    let expected: Vec<&str> = expected.split('\n').collect();
    let actual: Vec<&str> = actual.split('\n').collect();
    let max = expected.len().max(actual.len());
    let missing = "<missing>";
    let mut out = String::new();

    let first = (0..max).find(|&i| expected.get(i) != actual.get(i));
    match first {
        Some(i) => {
            let start = i.saturating_sub(2);
            let end = (i + 3).min(max);
            let _ = writeln!(&mut out, "first mismatch at line {}:", i + 1);
            for line in start..end {
                let marker = if line == i { ">" } else { " " };
                let left = expected.get(line).map_or(missing.to_string(), |s| escape_text(s));
                let right = actual.get(line).map_or(missing.to_string(), |s| escape_text(s));
                let _ = writeln!(&mut out, "{marker} {:>4}  expected: \"{left}\"", line + 1);
                let _ = writeln!(&mut out, "{marker} {:>4}    actual: \"{right}\"", line + 1);
            }
        }
        None => {
            let _ = writeln!(&mut out, "outputs are identical");
        }
    }
    out
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[default]
    Active,
    Xfail,
    Skip,
}

/// Line break setting of a case; mirrors the CLI's `--line-breaks` values.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseLineBreaks {
    #[default]
    Lf,
    Crlf,
    Keep,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SanitizeCase {
    pub id: String,
    pub input: String,
    pub output: String,
    /// Expected warning messages in order; `None` leaves warnings unchecked.
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub keep_comments: bool,
    #[serde(default)]
    pub line_breaks: CaseLineBreaks,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseManifest {
    format: String,
    cases: Vec<SanitizeCase>,
}

/// Loads and validates a case manifest. Panics with the offending path on any problem.
pub fn load_cases(path: &Path) -> Vec<SanitizeCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read case manifest {path:?}: {err}"));
    let manifest: CaseManifest = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse case manifest {path:?}: {err}"));
    assert_eq!(
        manifest.format, SANITIZE_CASES_FORMAT_V1,
        "unsupported case manifest format in {path:?}"
    );
    validate_cases(&manifest.cases, path);
    manifest.cases
}

fn validate_cases(cases: &[SanitizeCase], path: &Path) {
    assert!(!cases.is_empty(), "case manifest {path:?} has no cases");
    let mut ids = BTreeSet::new();
    for case in cases {
        assert!(
            !case.id.trim().is_empty() && case.id == case.id.trim(),
            "case id must be non-empty and trimmed in {path:?}: '{}'",
            case.id
        );
        assert!(ids.insert(case.id.as_str()), "duplicate case id in {path:?}: {}", case.id);
        let has_reason = case
            .reason
            .as_deref()
            .is_some_and(|reason| !reason.trim().is_empty());
        if case.status != CaseStatus::Active {
            assert!(has_reason, "non-active case must have a reason in {path:?}: {}", case.id);
        }
    }
}

/// Substring filter over case ids, read from an environment variable.
pub struct CaseFilter {
    raw: Option<String>,
}

impl CaseFilter {
    pub fn from_env(key: &str) -> Self {
        Self {
            raw: std::env::var(key).ok().filter(|value| !value.is_empty()),
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        match &self.raw {
            Some(filter) => id.contains(filter.as_str()),
            None => true,
        }
    }
}
