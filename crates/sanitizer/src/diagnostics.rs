//! Warning log.
//!
//! Every discarded or altered construct produces exactly one `Warning`. Warnings are data
//! handed back to the caller and are independent from the `log` output.

use crate::prepare::SourceMap;
use crate::tokenizer::Token;

/// A tag occurrence a warning refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRef {
    /// Lower-cased tag name as written (before alias resolution).
    pub name: String,
    /// Raw tag text as found in the escaped buffer (`&lt;b class=x&gt;`).
    pub text: String,
    /// Byte offset in the escaped working buffer.
    pub position: usize,
    /// Byte offset in the original input.
    pub input_position: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// `</tag/>`.
    BadClosingMarkup,
    /// `<tag/>` for a tag that is not single.
    DisallowedSelfClosing,
    /// `</br>`.
    ClosingSingleTag,
    DisallowedTag,
    ClosingTagWithAttributes,
    /// Closer matched an opener deeper in the stack; the openers above it were dropped
    /// (innermost first).
    PrematureClosing { discarded: Vec<String> },
    NoOpeningTag,
    RecursiveAlias { tag: String },
    UnknownAlias { alias: String, target: String },
    MissingRequired { attribute: String },
    UnterminatedString { text: String },
    BadKeyName { key: String },
    DisallowedAttribute { attribute: String, value: String },
    BadAttributeValue { attribute: String, value: String, reason: String },
    UndefinedChecker { checker: String, name: String },
    AttributeValueTail { value: String },
    DisallowedStyleProperty { property: String, value: String },
    BadStyle { property: String, value: String, reason: String },
    DoubleCommentStart,
    UnmatchedCommentEnd,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadClosingMarkup => f.write_str("bad </markup/> - tag discarded"),
            Self::DisallowedSelfClosing => {
                f.write_str("disallowed XML-style <tag /> - tag discarded")
            }
            Self::ClosingSingleTag => f.write_str("closing single tag - tag discarded"),
            Self::DisallowedTag => f.write_str("disallowed tag - tag discarded"),
            Self::ClosingTagWithAttributes => {
                f.write_str("closing tag has attribute(s) - tag discarded")
            }
            Self::PrematureClosing { discarded } => {
                f.write_str("bad nesting (premature closing tag) - discarded opened ")?;
                for name in discarded {
                    write!(f, "<{name}>")?;
                }
                Ok(())
            }
            Self::NoOpeningTag => f.write_str("bad nesting (no opening tag) - tag discarded"),
            Self::RecursiveAlias { tag } => {
                write!(f, "recursive alias reference of {tag} - tag discarded")
            }
            Self::UnknownAlias { alias, target } => {
                write!(f, "alias {alias} refers to unknown tag {target} - tag discarded")
            }
            Self::MissingRequired { attribute } => {
                write!(f, "missing required attribute \"{attribute}\" - tag discarded")
            }
            Self::UnterminatedString { text } => write!(
                f,
                "token contains unterminated string: \"{text}\" - attributes discarded"
            ),
            Self::BadKeyName { key } => {
                write!(f, "bad attribute key name \"{key}\" - attribute discarded")
            }
            Self::DisallowedAttribute { attribute, value } => write!(
                f,
                "disallowed attribute \"{attribute}\": \"{value}\" - attribute discarded"
            ),
            Self::BadAttributeValue {
                attribute,
                value,
                reason,
            } => write!(
                f,
                "bad value of \"{attribute}\" attribute: \"{value}\" ({reason}) - attribute discarded"
            ),
            Self::UndefinedChecker { checker, name } => write!(
                f,
                "undefined checker \"{checker}\" for \"{name}\" - attribute discarded"
            ),
            Self::AttributeValueTail { value } => {
                write!(f, "attribute value has a tail: \"{value}\" - tail discarded")
            }
            Self::DisallowedStyleProperty { property, value } => write!(
                f,
                "disallowed style property \"{property}\": \"{value}\" - property discarded"
            ),
            Self::BadStyle {
                property,
                value,
                reason,
            } => write!(
                f,
                "bad style of \"{property}\": \"{value}\" ({reason}) - property discarded"
            ),
            Self::DoubleCommentStart => {
                f.write_str("double <!-- comment <!-- start; processing stopped")
            }
            Self::UnmatchedCommentEnd => {
                f.write_str("unmatched --> comment end; processing stopped")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    /// Zero-based index of the token being processed when the warning was raised.
    pub token_index: usize,
    pub opener: Option<TagRef>,
    pub closer: Option<TagRef>,
}

impl Warning {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let at = self.opener.as_ref().or(self.closer.as_ref());
        match at {
            Some(tag) => write!(f, "{} (at byte {})", self.kind, tag.input_position),
            None => write!(f, "{} (token {})", self.kind, self.token_index),
        }
    }
}

/// Append-only warning log. A disabled log drops everything it is given.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    enabled: bool,
    warnings: Vec<Warning>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            warnings: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn push(&mut self, warning: Warning) {
        if self.enabled {
            self.warnings.push(warning);
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn take(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
    }

    pub fn extend(&mut self, warnings: Vec<Warning>) {
        if self.enabled {
            self.warnings.extend(warnings);
        }
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// Token indices a warning is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Site {
    pub(crate) token_index: usize,
    pub(crate) opener: Option<usize>,
    pub(crate) closer: Option<usize>,
}

impl Site {
    pub(crate) fn bare(token_index: usize) -> Self {
        Self {
            token_index,
            opener: None,
            closer: None,
        }
    }

    /// A lone token: openers are reported as `opener`, closers as `closer`.
    pub(crate) fn token(token_index: usize, token: &Token) -> Self {
        if token.closing {
            Self::pair(token_index, None, Some(token_index))
        } else {
            Self::pair(token_index, Some(token_index), None)
        }
    }

    pub(crate) fn pair(token_index: usize, opener: Option<usize>, closer: Option<usize>) -> Self {
        Self {
            token_index,
            opener,
            closer,
        }
    }
}

/// Per-pass collector that turns token indices into `TagRef`s.
pub(crate) struct Reporter<'a> {
    buffer: &'a str,
    tokens: &'a [Token],
    source_map: &'a SourceMap,
    enabled: bool,
    warnings: Vec<Warning>,
    raised: usize,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(
        buffer: &'a str,
        tokens: &'a [Token],
        source_map: &'a SourceMap,
        enabled: bool,
    ) -> Self {
        Self {
            buffer,
            tokens,
            source_map,
            enabled,
            warnings: Vec::new(),
            raised: 0,
        }
    }

    pub(crate) fn buffer(&self) -> &'a str {
        self.buffer
    }

    pub(crate) fn token(&self, index: usize) -> &'a Token {
        &self.tokens[index]
    }

    pub(crate) fn warn(&mut self, site: Site, kind: WarningKind) {
        self.raised += 1;
        log::trace!(target: "sanitizer.matcher", "token {}: {kind}", site.token_index);
        if !self.enabled {
            return;
        }
        let warning = Warning {
            kind,
            token_index: site.token_index,
            opener: site.opener.map(|index| self.tag_ref(index)),
            closer: site.closer.map(|index| self.tag_ref(index)),
        };
        self.warnings.push(warning);
    }

    /// Warnings raised during this pass, counted even when collection is disabled.
    pub(crate) fn raised(&self) -> usize {
        self.raised
    }

    pub(crate) fn finish(self) -> Vec<Warning> {
        self.warnings
    }

    fn tag_ref(&self, index: usize) -> TagRef {
        let token = &self.tokens[index];
        TagRef {
            name: token.name.clone(),
            text: token.text(self.buffer).to_string(),
            position: token.span.start,
            input_position: self.source_map.input_offset(token.span.start),
        }
    }
}
