//! Engine entry points.

use std::sync::Arc;

use crate::config::{CommentPolicy, SanitizerConfig};
use crate::diagnostics::{Diagnostics, Reporter, Warning};
use crate::error::EncodingError;
use crate::matcher::Matcher;
use crate::prepare::{normalize_line_breaks, prepare};
use crate::rewrite::apply;
use crate::tokenizer::tokenize;

/// Output of one `sanitize` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sanitized {
    pub output: String,
    pub warnings: Vec<Warning>,
}

/// Sanitizes `input` with `config`. Fails only when `input` is not UTF-8.
pub fn sanitize(input: &[u8], config: &SanitizerConfig) -> Result<Sanitized, EncodingError> {
    let input = std::str::from_utf8(input)?;
    let mut diagnostics = Diagnostics::new(config.collect_warnings);
    let output = run(input, config, &mut diagnostics);
    Ok(Sanitized {
        output,
        warnings: diagnostics.into_warnings(),
    })
}

/// Sanitizes `html` with the standard policy, discarding warnings.
pub fn clean(html: &str) -> String {
    let config = SanitizerConfig::shared_default();
    run(html, &config, &mut Diagnostics::new(false))
}

/// Warnings are only built when both the policy and the receiving log want them.
fn collects(config: &SanitizerConfig, diagnostics: &Diagnostics) -> bool {
    config.collect_warnings && diagnostics.is_enabled()
}

fn run(input: &str, config: &SanitizerConfig, diagnostics: &mut Diagnostics) -> String {
    let prepared = prepare(input, config.comments);
    let tokens = tokenize(&prepared.buffer, config.comments == CommentPolicy::Retain);
    let mut reporter = Reporter::new(
        &prepared.buffer,
        &tokens,
        &prepared.source_map,
        collects(config, diagnostics),
    );
    let outcome = Matcher::new(config, &tokens, &mut reporter).run();
    let edits = outcome.edits.len();
    let output = apply(&prepared.buffer, outcome.edits);
    let output = normalize_line_breaks(output, &config.line_breaks);

    log::debug!(
        target: "sanitizer",
        "sanitized {} bytes: {} tokens, {} edits, {} warnings, {} left open, max depth {}, {} scanned",
        input.len(),
        tokens.len(),
        edits,
        reporter.raised(),
        outcome.unclosed,
        outcome.max_depth,
        outcome.scanned
    );
    diagnostics.extend(reporter.finish());
    output
}

/// An engine instance: a shared, read-only configuration plus a warning log that
/// accumulates across calls until the caller resets it.
///
/// Per-call state lives on the stack of each call, so one instance can be reused for any
/// number of inputs; it must not be shared between threads while cleaning.
#[derive(Clone, Debug)]
pub struct Sanitizer {
    config: Arc<SanitizerConfig>,
    diagnostics: Diagnostics,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::with_shared(SanitizerConfig::shared_default())
    }
}

impl Sanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self::with_shared(Arc::new(config))
    }

    pub fn with_shared(config: Arc<SanitizerConfig>) -> Self {
        Self {
            diagnostics: Diagnostics::new(config.collect_warnings),
            config,
        }
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    pub fn clean(&mut self, html: &str) -> String {
        run(html, &self.config, &mut self.diagnostics)
    }

    pub fn clean_bytes(&mut self, input: &[u8]) -> Result<String, EncodingError> {
        let html = std::str::from_utf8(input)?;
        Ok(self.clean(html))
    }

    /// Warnings from every call since the last reset, in order.
    pub fn warnings(&self) -> &[Warning] {
        self.diagnostics.warnings()
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        self.diagnostics.take()
    }

    pub fn clear_warnings(&mut self) {
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineBreaks;
    use crate::diagnostics::WarningKind;

    fn standard(input: &str) -> Sanitized {
        sanitize(input.as_bytes(), &SanitizerConfig::default()).unwrap()
    }

    fn messages(sanitized: &Sanitized) -> Vec<String> {
        sanitized.warnings.iter().map(Warning::message).collect()
    }

    #[test]
    fn dirty_markup_passes_with_aliases_resolved() {
        let out = standard("<p><b><i>Dirty</i> markup</b>.</p>");
        assert_eq!(out.output, "<p><strong><em>Dirty</em> markup</strong>.</p>");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn script_url_in_image_keeps_tag_inert() {
        let out = standard(r#"<img src="javascript:alert(1)">"#);
        assert_eq!(out.output, r#"&lt;img src="javascript:alert(1)"&gt;"#);
        assert_eq!(out.warnings.len(), 2);
        assert!(matches!(
            &out.warnings[0].kind,
            WarningKind::BadAttributeValue { attribute, .. } if attribute == "src"
        ));
        assert_eq!(
            out.warnings[1].kind,
            WarningKind::MissingRequired {
                attribute: "src".to_string()
            }
        );
        let opener = out.warnings[0].opener.as_ref().unwrap();
        assert_eq!(opener.name, "img");
        assert_eq!(opener.input_position, 0);
    }

    #[test]
    fn valid_image_is_rendered_with_quoted_values() {
        let out = standard("<img src=\"/a.png\" alt=x>");
        assert_eq!(out.output, r#"<img src="/a.png" alt="x">"#);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn premature_closer_keeps_outer_pair() {
        let out = standard("<a href=\"#top\"><b></a></b>");
        assert_eq!(out.output, "<a href=\"#top\">&lt;b&gt;</a>&lt;/b&gt;");
        assert_eq!(
            messages(&out),
            vec![
                "bad nesting (premature closing tag) - discarded opened <b>",
                "bad nesting (no opening tag) - tag discarded",
            ]
        );
        let premature = &out.warnings[0];
        assert_eq!(premature.opener.as_ref().map(|tag| tag.name.as_str()), Some("b"));
        assert_eq!(premature.closer.as_ref().map(|tag| tag.name.as_str()), Some("a"));
    }

    #[test]
    fn unknown_tags_stay_escaped() {
        let out = standard("<script>alert(1)</script><iframe src=x>");
        assert_eq!(
            out.output,
            "&lt;script&gt;alert(1)&lt;/script&gt;&lt;iframe src=x&gt;"
        );
        assert_eq!(out.warnings.len(), 3);
    }

    #[test]
    fn style_keeps_only_valid_declarations() {
        let out = standard(r#"<span style="color: red; position: absolute">x</span>"#);
        assert_eq!(out.output, r#"<span style="color: red">x</span>"#);
        assert_eq!(
            messages(&out),
            vec![r#"disallowed style property "position": "absolute" - property discarded"#]
        );

        let out = standard(r#"<span style="position: fixed">x</span>"#);
        assert_eq!(out.output, "<span>x</span>");
        assert_eq!(out.warnings.len(), 2);
        assert!(matches!(
            &out.warnings[1].kind,
            WarningKind::BadAttributeValue { attribute, .. } if attribute == "style"
        ));
    }

    #[test]
    fn output_is_stable_under_resanitizing() {
        let config = SanitizerConfig::default();
        for input in [
            "<p><b><i>Dirty</i> markup</b>.</p>",
            r#"<img src="javascript:alert(1)">"#,
            "<a href=\"#top\"><b></a></b>",
            "&amp;lt;script&amp;gt; &lt;b&gt; & <br/>",
            r#"<span style="color: red; position: absolute" title='a "b"'>x</span>"#,
            "<div><p>unclosed",
            "x<!-- hidden <b> -->y",
        ] {
            let once = sanitize(input.as_bytes(), &config).unwrap().output;
            let twice = sanitize(once.as_bytes(), &config).unwrap();
            assert_eq!(twice.output, once, "input: {input}");
        }
    }

    #[test]
    fn literal_references_survive() {
        let out = standard("&lt;b&gt; &amp;lt; &copy; a & b");
        assert_eq!(out.output, "&lt;b&gt; &amp;lt; &copy; a &amp; b");
    }

    #[test]
    fn comments_are_stripped_or_retained() {
        assert_eq!(standard("a<!-- <b> -->b").output, "ab");

        let mut config = SanitizerConfig::default();
        config.comments = CommentPolicy::Retain;
        let out = sanitize(b"<p>a<!-- <b> --></p>", &config).unwrap();
        assert_eq!(out.output, "<p>a<!-- &lt;b&gt; --></p>");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn line_breaks_follow_config() {
        assert_eq!(standard("a\r\nb\rc\n").output, "a\nb\nc\n");

        let mut config = SanitizerConfig::default();
        config.line_breaks = LineBreaks::Keep;
        assert_eq!(sanitize(b"a\r\nb", &config).unwrap().output, "a\r\nb");
        config.line_breaks = LineBreaks::Replace("<br>".to_string());
        assert_eq!(sanitize(b"a\nb", &config).unwrap().output, "a<br>b");
    }

    #[test]
    fn invalid_utf8_is_fatal() {
        let err = sanitize(b"ok\xffnope", &SanitizerConfig::default()).unwrap_err();
        assert_eq!(err.valid_up_to, 2);
        let mut engine = Sanitizer::default();
        assert!(engine.clean_bytes(b"\xc3").is_err());
        assert!(engine.warnings().is_empty());
    }

    #[test]
    fn engine_accumulates_until_reset() {
        let mut engine = Sanitizer::default();
        assert_eq!(engine.clean("<x>"), "&lt;x&gt;");
        assert_eq!(engine.clean("</y>"), "&lt;/y&gt;");
        assert_eq!(engine.warnings().len(), 2);
        assert_eq!(engine.take_warnings().len(), 2);
        assert!(engine.warnings().is_empty());
        engine.clean("<x>");
        engine.clear_warnings();
        assert!(engine.warnings().is_empty());
    }

    #[test]
    fn warnings_can_be_disabled() {
        let mut config = SanitizerConfig::default();
        config.collect_warnings = false;
        let mut engine = Sanitizer::new(config);
        assert_eq!(engine.clean("<x>"), "&lt;x&gt;");
        assert!(engine.warnings().is_empty());
    }

    #[test]
    fn positions_point_into_original_input() {
        let out = standard("a & b <x>");
        let opener = out.warnings[0].opener.as_ref().unwrap();
        assert_eq!(opener.input_position, 6);
        assert_eq!(opener.text, "&lt;x&gt;");
    }

    #[test]
    fn convenience_clean_uses_standard_policy() {
        assert_eq!(clean("<em>x</em><u onclick=y>z</u>"), "<em>x</em><u>z</u>");
    }

    #[test]
    fn warnings_are_built_only_when_policy_and_log_both_want_them() {
        let config = SanitizerConfig::default();
        assert!(collects(&config, &Diagnostics::new(true)));
        assert!(!collects(&config, &Diagnostics::new(false)));
        let mut quiet = config.clone();
        quiet.collect_warnings = false;
        assert!(!collects(&quiet, &Diagnostics::new(true)));

        let mut log = Diagnostics::new(false);
        let out = run("<x>y</p>", &config, &mut log);
        assert_eq!(out, "&lt;x&gt;y&lt;/p&gt;");
        assert!(log.is_empty());
    }
}
