//! Lexical scan of the escaped working buffer.
//!
//! Recognizes `&lt;(/?)NAME(ATTRS)?(/?)&gt;` where NAME is ASCII `[A-Za-z0-9]+` and ATTRS
//! starts with whitespace and runs lazily to the first `&gt;`, plus the literal `<!--` / `-->`
//! markers left in place by a retained comment. No validation happens here.
//!
//! Since every `<` and `>` of the input has been escaped by the preparer, literal `<`/`>`
//! bytes in the buffer only belong to comment markers; attribute text never extends across
//! one.

use memchr::memmem;

const TAG_OPEN: &[u8] = b"&lt;";
const TAG_CLOSE: &[u8] = b"&gt;";
const SELF_CLOSE: &[u8] = b"/&gt;";
const COMMENT_START: &[u8] = b"<!--";

/// Byte span into the escaped working buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn slice(self, buffer: &str) -> &str {
        &buffer[self.start..self.end]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Tag,
    CommentStart,
    CommentEnd,
}

/// One scanned construct. Produced once per sanitize pass and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Full matched text.
    pub span: Span,
    /// `</name>` form.
    pub closing: bool,
    /// ASCII-lowercased tag name; empty for comment markers.
    pub name: String,
    /// Raw attribute text between the name and the closing delimiter (still escaped).
    pub attrs: Span,
    /// `<name/>` form.
    pub self_closing: bool,
}

impl Token {
    fn marker(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            closing: false,
            name: String::new(),
            attrs: Span::new(span.end, span.end),
            self_closing: false,
        }
    }

    pub fn text<'b>(&self, buffer: &'b str) -> &'b str {
        self.span.slice(buffer)
    }

    pub fn attr_text<'b>(&self, buffer: &'b str) -> &'b str {
        self.attrs.slice(buffer)
    }

    /// Whether the attribute text contains anything but whitespace (`</p >` does not).
    pub fn has_attributes(&self, buffer: &str) -> bool {
        self.attr_text(buffer).bytes().any(|b| !is_space(b))
    }
}

/// ASCII whitespace as matched by `\s` in the tag pattern (includes vertical tab).
pub(crate) fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0B
}

/// Scans `buffer` into an ordered token list. Comment markers are only reported when
/// `track_comments` is set.
pub fn tokenize(buffer: &str, track_comments: bool) -> Vec<Token> {
    let bytes = buffer.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let rel = if track_comments {
            memchr::memchr3(b'&', b'<', b'>', &bytes[i..])
        } else {
            memchr::memchr(b'&', &bytes[i..])
        };
        let Some(rel) = rel else {
            break;
        };
        let pos = i + rel;
        match bytes[pos] {
            b'&' => match scan_tag(buffer, pos) {
                Some(token) => {
                    i = token.span.end;
                    out.push(token);
                }
                None => i = pos + 1,
            },
            b'<' if bytes[pos..].starts_with(COMMENT_START) => {
                let span = Span::new(pos, pos + COMMENT_START.len());
                out.push(Token::marker(TokenKind::CommentStart, span));
                i = span.end;
            }
            b'>' if pos >= 2 && &bytes[pos - 2..pos] == b"--" => {
                out.push(Token::marker(TokenKind::CommentEnd, Span::new(pos - 2, pos + 1)));
                i = pos + 1;
            }
            _ => i = pos + 1,
        }
    }

    log::trace!(target: "sanitizer.tokenizer", "scanned {} tokens", out.len());
    out
}

fn scan_tag(buffer: &str, start: usize) -> Option<Token> {
    let bytes = buffer.as_bytes();
    if !bytes[start..].starts_with(TAG_OPEN) {
        return None;
    }
    let mut j = start + TAG_OPEN.len();
    let closing = bytes.get(j) == Some(&b'/');
    if closing {
        j += 1;
    }
    let name_start = j;
    while j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
        j += 1;
    }
    if j == name_start {
        return None;
    }
    let name_end = j;
    let rest = &bytes[name_end..];

    let (attrs_end, self_closing, end) = if rest.starts_with(TAG_CLOSE) {
        (name_end, false, name_end + TAG_CLOSE.len())
    } else if rest.starts_with(SELF_CLOSE) {
        (name_end, true, name_end + SELF_CLOSE.len())
    } else if rest.first().is_some_and(|&b| is_space(b)) {
        let search_from = name_end + 1;
        let limit = memchr::memchr2(b'<', b'>', &bytes[search_from..])
            .map_or(bytes.len(), |rel| search_from + rel);
        let close = search_from + memmem::find(&bytes[search_from..limit], TAG_CLOSE)?;
        if bytes[close - 1] == b'/' {
            (close - 1, true, close + TAG_CLOSE.len())
        } else {
            (close, false, close + TAG_CLOSE.len())
        }
    } else {
        return None;
    };

    Some(Token {
        kind: TokenKind::Tag,
        span: Span::new(start, end),
        closing,
        name: buffer[name_start..name_end].to_ascii_lowercase(),
        attrs: Span::new(name_end, attrs_end),
        self_closing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(buffer: &str, tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|token| match token.kind {
                TokenKind::CommentStart => format!("CommentStart@{}", token.span.start),
                TokenKind::CommentEnd => format!("CommentEnd@{}", token.span.start),
                TokenKind::Tag => format!(
                    "{}{}[{}]{}@{}",
                    if token.closing { "/" } else { "" },
                    token.name,
                    token.attr_text(buffer),
                    if token.self_closing { "/" } else { "" },
                    token.span.start
                ),
            })
            .collect()
    }

    #[test]
    fn scans_open_close_and_self_closing_tags() {
        let buffer = "&lt;p&gt;x&lt;/p&gt;&lt;br/&gt;&lt;BR /&gt;";
        let tokens = tokenize(buffer, false);
        assert_eq!(
            describe(buffer, &tokens),
            vec!["p[]@0", "/p[]@10", "br[]/@20", "br[ ]/@31"]
        );
        assert_eq!(tokens[0].text(buffer), "&lt;p&gt;");
    }

    #[test]
    fn attribute_text_runs_lazily_to_first_close() {
        let buffer = "&lt;a href=\"x\" title='y'&gt;z&gt;";
        let tokens = tokenize(buffer, false);
        assert_eq!(describe(buffer, &tokens), vec![r#"a[ href="x" title='y']@0"#]);
    }

    #[test]
    fn attribute_text_may_span_lines() {
        let buffer = "&lt;li\n  value=\"1\"\n&gt;";
        let tokens = tokenize(buffer, false);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].attr_text(buffer), "\n  value=\"1\"\n");
    }

    #[test]
    fn slash_before_close_is_self_closing_even_with_attributes() {
        let buffer = "&lt;input data-foo=/&gt;";
        let tokens = tokenize(buffer, false);
        assert_eq!(describe(buffer, &tokens), vec!["input[ data-foo=]/@0"]);
    }

    #[test]
    fn rejects_names_not_followed_by_delimiter() {
        for buffer in ["&lt; b&gt;", "&lt;/ b&gt;", "&lt;a-b&gt;", "&lt;&gt;", "&lt;/&gt;", "&lt;p"] {
            assert!(tokenize(buffer, false).is_empty(), "buffer {buffer:?}");
        }
    }

    #[test]
    fn closing_tag_with_attributes_and_trailing_space() {
        let buffer = "&lt;/b data-x&gt;&lt;/p &gt;";
        let tokens = tokenize(buffer, false);
        assert!(tokens[0].closing && tokens[0].has_attributes(buffer));
        assert!(tokens[1].closing && !tokens[1].has_attributes(buffer));
    }

    #[test]
    fn protected_references_are_not_tags() {
        let buffer = "&amp;lt;p&amp;gt; &lt;p&gt;";
        let tokens = tokenize(buffer, false);
        assert_eq!(describe(buffer, &tokens), vec!["p[]@18"]);
    }

    #[test]
    fn comment_markers_are_tracked_on_request() {
        let buffer = "&lt;b&gt;<!-- &lt;i&gt; -->&lt;/b&gt;";
        let tokens = tokenize(buffer, true);
        assert_eq!(
            describe(buffer, &tokens),
            vec!["b[]@0", "CommentStart@9", "i[]@14", "CommentEnd@24", "/b[]@27"]
        );
        assert_eq!(tokenize(buffer, false).len(), 3);
    }

    #[test]
    fn attribute_text_does_not_cross_comment_markers() {
        let buffer = "<!-- &lt;b x -->y&gt;";
        let tokens = tokenize(buffer, true);
        assert_eq!(describe(buffer, &tokens), vec!["CommentStart@0", "CommentEnd@13"]);
    }

    #[test]
    fn non_ascii_text_between_tags() {
        let buffer = "é&lt;b&gt;ï&lt;/b&gt;ö";
        let tokens = tokenize(buffer, false);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text(buffer), "&lt;/b&gt;");
    }
}
