//! Preparer and Finisher: the escape pass that runs before tokenization and its inverse
//! bookkeeping after rewriting.
//!
//! The preparer escapes `<`, `>` and every `&` that does not start a well-formed character
//! reference. Literal `&lt;`/`&gt;` already present in the input would then be
//! indistinguishable from escaped markup, so every `&(amp;)*lt;` / `&(amp;)*gt;` sequence
//! gets one extra `amp;` ("protection"), which `unprotect` removes again. The mapping is a
//! bijection, so input such as `&amp;lt;` survives unchanged.

use std::borrow::Cow;

use memchr::memmem;

use crate::config::{CommentPolicy, LineBreaks};
use crate::entities::reference_end;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const PROTECT: &str = "amp;";

/// Maps byte offsets in the escaped working buffer back to the original input.
///
/// Anchors are recorded around every rewritten construct; between anchors the buffer is a
/// verbatim copy of the input.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    anchors: Vec<(usize, usize)>,
}

impl SourceMap {
    fn record(&mut self, buffer: usize, input: usize) {
        if let Some(last) = self.anchors.last_mut() {
            debug_assert!(last.0 <= buffer && last.1 <= input);
            if last.0 == buffer {
                *last = (buffer, input);
                return;
            }
        }
        self.anchors.push((buffer, input));
    }

    /// Input offset of the byte at `buffer_offset` in the escaped buffer.
    pub fn input_offset(&self, buffer_offset: usize) -> usize {
        let idx = self
            .anchors
            .partition_point(|&(buffer, _)| buffer <= buffer_offset);
        if idx == 0 {
            return buffer_offset;
        }
        let (buffer, input) = self.anchors[idx - 1];
        let mapped = input + (buffer_offset - buffer);
        match self.anchors.get(idx) {
            Some(&(_, next_input)) => mapped.min(next_input),
            None => mapped,
        }
    }
}

pub(crate) struct Prepared {
    pub(crate) buffer: String,
    pub(crate) source_map: SourceMap,
}

struct Preparer<'a> {
    input: &'a str,
    out: String,
    map: SourceMap,
    comments: CommentPolicy,
}

/// Escapes `input` into the working buffer, stripping or retaining `<!-- ... -->` comments.
///
/// An unterminated comment runs to the end of input.
pub(crate) fn prepare(input: &str, comments: CommentPolicy) -> Prepared {
    let mut preparer = Preparer {
        input,
        out: String::with_capacity(input.len() + input.len() / 8),
        map: SourceMap::default(),
        comments,
    };
    preparer.escape_range(0, input.len(), true);
    log::trace!(
        target: "sanitizer.prepare",
        "escaped {} input bytes into {} buffer bytes",
        input.len(),
        preparer.out.len()
    );
    Prepared {
        buffer: preparer.out,
        source_map: preparer.map,
    }
}

impl Preparer<'_> {
    fn escape_range(&mut self, start: usize, end: usize, detect_comments: bool) {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut i = start;
        let mut copy_start = start;

        while i < end {
            let Some(rel) = memchr::memchr3(b'&', b'<', b'>', &bytes[i..end]) else {
                break;
            };
            i += rel;
            self.out.push_str(&input[copy_start..i]);

            match bytes[i] {
                b'<' if detect_comments && input[i..end].starts_with(COMMENT_START) => {
                    let body_start = i + COMMENT_START.len();
                    let (body_end, after) =
                        match memmem::find(&bytes[body_start..end], COMMENT_END.as_bytes()) {
                            Some(rel) => (body_start + rel, body_start + rel + COMMENT_END.len()),
                            None => (end, end),
                        };
                    self.map.record(self.out.len(), i);
                    if self.comments == CommentPolicy::Retain {
                        self.out.push_str(COMMENT_START);
                        self.map.record(self.out.len(), body_start);
                        self.escape_range(body_start, body_end, false);
                        self.map.record(self.out.len(), body_end);
                        self.out.push_str(COMMENT_END);
                    }
                    self.map.record(self.out.len(), after);
                    i = after;
                }
                b'<' => i = self.replace(i, 1, "&lt;"),
                b'>' => i = self.replace(i, 1, "&gt;"),
                _ => {
                    if let Some(protected) = protected_end(&input[..end], i) {
                        self.map.record(self.out.len(), i);
                        self.out.push('&');
                        self.out.push_str(PROTECT);
                        self.out.push_str(&input[i + 1..protected]);
                        self.map.record(self.out.len(), protected);
                        i = protected;
                    } else if let Some(reference) = reference_end(&input[..end], i) {
                        // Existing references are copied verbatim.
                        copy_start = i;
                        i = reference;
                        continue;
                    } else {
                        i = self.replace(i, 1, "&amp;");
                    }
                }
            }
            copy_start = i;
        }

        if copy_start < end {
            self.out.push_str(&input[copy_start..end]);
        }
    }

    fn replace(&mut self, at: usize, len: usize, with: &str) -> usize {
        self.map.record(self.out.len(), at);
        self.out.push_str(with);
        self.map.record(self.out.len(), at + len);
        at + len
    }
}

/// End of an `&(amp;)*lt;` or `&(amp;)*gt;` sequence starting at `i`.
fn protected_end(s: &str, i: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.get(i) != Some(&b'&') {
        return None;
    }
    let mut j = i + 1;
    while bytes[j..].starts_with(PROTECT.as_bytes()) {
        j += PROTECT.len();
    }
    if bytes[j..].starts_with(b"lt;") || bytes[j..].starts_with(b"gt;") {
        Some(j + 3)
    } else {
        None
    }
}

/// Removes the protection added by `prepare` (one `amp;` per protected sequence).
pub(crate) fn unprotect(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let finder = memmem::Finder::new(b"&amp;");
    let mut out: Option<String> = None;
    let mut copy_start = 0;
    let mut i = 0;

    while let Some(rel) = finder.find(&bytes[i..]) {
        let at = i + rel;
        if protected_end(s, at).is_some() {
            let buf = out.get_or_insert_with(|| String::with_capacity(s.len()));
            buf.push_str(&s[copy_start..at + 1]);
            copy_start = at + 1 + PROTECT.len();
        }
        i = at + 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&s[copy_start..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(s),
    }
}

/// Replaces every `\r\n`, `\r` and `\n` according to `line_breaks`.
pub(crate) fn normalize_line_breaks(s: String, line_breaks: &LineBreaks) -> String {
    let LineBreaks::Replace(with) = line_breaks else {
        return s;
    };
    if memchr::memchr2(b'\r', b'\n', s.as_bytes()).is_none() {
        return s;
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(with);
            }
            '\n' => out.push_str(with),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(input: &str) -> String {
        prepare(input, CommentPolicy::Strip).buffer
    }

    #[test]
    fn escapes_markup_but_keeps_existing_references() {
        assert_eq!(escape("<p>a & b</p>"), "&lt;p&gt;a &amp; b&lt;/p&gt;");
        assert_eq!(escape("&mdash; &#8212; &amp;"), "&mdash; &#8212; &amp;");
        assert_eq!(escape("\"quotes\" 'stay'"), "\"quotes\" 'stay'");
    }

    #[test]
    fn protects_literal_lt_gt_references() {
        assert_eq!(escape("&lt;b&gt;"), "&amp;lt;b&amp;gt;");
        assert_eq!(escape("&amp;lt;"), "&amp;amp;lt;");
        assert_eq!(unprotect("&amp;lt;b&amp;gt;"), "&lt;b&gt;");
        assert_eq!(unprotect("&amp;amp;lt;"), "&amp;lt;");
    }

    #[test]
    fn unprotect_leaves_plain_ampersand_escapes() {
        assert_eq!(unprotect("a &amp; b"), "a &amp; b");
        assert_eq!(unprotect("&amp;&amp;lt;"), "&amp;&lt;");
        assert!(matches!(unprotect("&lt;p&gt;"), Cow::Borrowed(_)));
    }

    #[test]
    fn protection_round_trips_for_reference_like_text() {
        for input in ["&lt;", "&gt;", "&amp;lt;", "&amp;amp;gt;", "&&lt;", "x&lt"] {
            let escaped = escape(input);
            assert_eq!(unprotect(&escaped), escape_unprotected(input), "input {input:?}");
        }
    }

    // Escaping without the protection step, which is what unprotect must restore.
    fn escape_unprotected(input: &str) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < input.len() {
            let rest = &input[i..];
            if let Some(end) = reference_end(input, i) {
                out.push_str(&input[i..end]);
                i = end;
                continue;
            }
            let ch = rest.chars().next().unwrap();
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(ch),
            }
            i += ch.len_utf8();
        }
        out
    }

    #[test]
    fn strips_comments_including_unterminated_tail() {
        assert_eq!(escape("a<!-- <b>x</b> -->b"), "ab");
        assert_eq!(escape("a<!-- never closed <i>"), "a");
        assert_eq!(escape("<!-->x-->y"), "y");
    }

    #[test]
    fn retains_comments_with_escaped_body() {
        let prepared = prepare("a<!-- <b> -->c<!--tail", CommentPolicy::Retain);
        assert_eq!(prepared.buffer, "a<!-- &lt;b&gt; -->c<!--tail-->");
    }

    #[test]
    fn source_map_points_back_into_input() {
        let input = "é <b>x</b> &lt;i&gt;";
        let prepared = prepare(input, CommentPolicy::Strip);
        let buffer = &prepared.buffer;
        let open = buffer.find("&lt;b&gt;").unwrap();
        let close = buffer.find("&lt;/b&gt;").unwrap();
        assert_eq!(prepared.source_map.input_offset(open), input.find("<b>").unwrap());
        assert_eq!(prepared.source_map.input_offset(close), input.find("</b>").unwrap());
        assert_eq!(prepared.source_map.input_offset(0), 0);
    }

    #[test]
    fn source_map_skips_stripped_comments() {
        let input = "<!-- c --><p>";
        let prepared = prepare(input, CommentPolicy::Strip);
        assert_eq!(prepared.buffer, "&lt;p&gt;");
        assert_eq!(prepared.source_map.input_offset(0), input.find("<p>").unwrap());
    }

    #[test]
    fn line_breaks_are_normalized_or_kept() {
        let crlf = LineBreaks::Replace("\r\n".to_string());
        assert_eq!(normalize_line_breaks("a\nb\r\nc\rd".to_string(), &crlf), "a\r\nb\r\nc\r\nd");
        let lf = LineBreaks::Replace("\n".to_string());
        assert_eq!(normalize_line_breaks("a\r\n\r\nb".to_string(), &lf), "a\n\nb");
        assert_eq!(normalize_line_breaks("a\r\nb".to_string(), &LineBreaks::Keep), "a\r\nb");
    }
}
