//! Text and JSON rendering of a sanitize run.

use sanitizer::{TagRef, Warning};
use serde::Serialize;

#[derive(Serialize)]
struct JsonTag<'w> {
    name: &'w str,
    text: &'w str,
    position: usize,
    input_position: usize,
}

#[derive(Serialize)]
struct JsonWarning<'w> {
    message: String,
    token_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    opener: Option<JsonTag<'w>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    closer: Option<JsonTag<'w>>,
}

#[derive(Serialize)]
struct JsonReport<'w> {
    output: &'w str,
    warnings: Vec<JsonWarning<'w>>,
}

fn json_tag(tag: &TagRef) -> JsonTag<'_> {
    JsonTag {
        name: &tag.name,
        text: &tag.text,
        position: tag.position,
        input_position: tag.input_position,
    }
}

pub fn to_json(output: &str, warnings: &[Warning]) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        output,
        warnings: warnings
            .iter()
            .map(|warning| JsonWarning {
                message: warning.message(),
                token_index: warning.token_index,
                opener: warning.opener.as_ref().map(json_tag),
                closer: warning.closer.as_ref().map(json_tag),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}

/// One `warning:` line per warning, pointing into the original input.
pub fn warning_lines(warnings: &[Warning]) -> Vec<String> {
    warnings
        .iter()
        .map(|warning| format!("warning: {warning}"))
        .collect()
}
