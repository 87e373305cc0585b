//! Applies validated replacements to the escaped buffer.
//!
//! Edits are collected during matching and applied in one left-to-right rebuild, so no
//! running offset shift has to be tracked. Untouched regions are un-protected on the way
//! (see `prepare::unprotect`); engine-emitted replacements are copied verbatim.

use crate::prepare::unprotect;
use crate::tokenizer::Span;

/// Replace the text at `span` (a whole tag token) with `replacement`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Edit {
    pub(crate) span: Span,
    pub(crate) replacement: String,
}

impl Edit {
    pub(crate) fn new(span: Span, replacement: String) -> Self {
        Self { span, replacement }
    }
}

/// Rebuilds `buffer` with `edits` applied. Edits must not overlap.
pub(crate) fn apply(buffer: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_unstable_by_key(|edit| edit.span.start);
    let mut out = String::with_capacity(buffer.len());
    let mut cursor = 0;

    for edit in &edits {
        debug_assert!(edit.span.start >= cursor, "overlapping edits");
        out.push_str(&unprotect(&buffer[cursor..edit.span.start]));
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&unprotect(&buffer[cursor..]));

    log::trace!(
        target: "sanitizer.rewrite",
        "applied {} edits, {} -> {} bytes",
        edits.len(),
        buffer.len(),
        out.len()
    );
    out
}
