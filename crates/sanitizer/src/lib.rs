//! Deny-by-default HTML sanitizer.
//!
//! All input is escaped first; only allow-listed, well-nested tags whose attributes and
//! inline styles pass validation are turned back into live markup. Everything else stays
//! visible as inert text, and every discarded construct is reported as a `Warning`.

pub mod golden_corpus;
pub mod perf_fixtures;

mod attr_map;
mod checkers;
mod config;
mod css;
mod defaults;
mod diagnostics;
mod entities;
mod error;
mod matcher;
mod prepare;
mod rewrite;
mod rules;
mod sanitizer;
mod stack;
mod tokenizer;
mod validate;
mod wildcard;

pub use crate::checkers::{Checker, CheckerRegistry, Predicate, Validator, Verdict};
pub use crate::config::{CommentPolicy, LineBreaks, SanitizerConfig};
pub use crate::css::clean_css;
pub use crate::defaults::{CSS_PROPERTIES, GLOBAL_RULES, PATTERN_CHECKERS, css_checker, standard_policy};
pub use crate::diagnostics::{Diagnostics, TagRef, Warning, WarningKind};
pub use crate::error::{ConfigError, EncodingError};
pub use crate::prepare::SourceMap;
pub use crate::rules::{Rule, TagSpec, find_rule, parse_rules};
pub use crate::sanitizer::{Sanitized, Sanitizer, clean, sanitize};
pub use crate::tokenizer::{Span, Token, TokenKind, tokenize};
pub use crate::validate::Scope;
