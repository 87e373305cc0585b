//! Stack matcher: decides per token whether it is re-admitted as markup or stays escaped.
//!
//! Tokens are consumed once, in buffer order. The only re-processing happens after a
//! premature closer popped the stack down to its opener; the same token is then handled
//! again, and since the stack shrank strictly the loop stays bounded.

use crate::config::SanitizerConfig;
use crate::diagnostics::{Reporter, Site, WarningKind};
use crate::rewrite::Edit;
use crate::stack::{OpenTag, OpenTagStack};
use crate::tokenizer::{Token, TokenKind};
use crate::validate::{Scope, render_closer, render_opener};

pub(crate) struct MatchOutcome {
    pub(crate) edits: Vec<Edit>,
    /// Openers still on the stack at the end of input; they stay escaped.
    pub(crate) unclosed: usize,
    pub(crate) max_depth: usize,
    /// Stack entries walked while recovering from misnested closers.
    pub(crate) scanned: usize,
}

enum Step {
    Next,
    Repeat,
}

pub(crate) struct Matcher<'r, 'a> {
    config: &'a SanitizerConfig,
    tokens: &'a [Token],
    reporter: &'r mut Reporter<'a>,
    stack: OpenTagStack,
    edits: Vec<Edit>,
}

impl<'r, 'a> Matcher<'r, 'a> {
    pub(crate) fn new(
        config: &'a SanitizerConfig,
        tokens: &'a [Token],
        reporter: &'r mut Reporter<'a>,
    ) -> Self {
        Self {
            config,
            tokens,
            reporter,
            stack: OpenTagStack::default(),
            edits: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> MatchOutcome {
        let tokens = self.tokens;
        let mut in_comment = false;
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            match token.kind {
                TokenKind::CommentStart | TokenKind::CommentEnd => {
                    let is_start = token.kind == TokenKind::CommentStart;
                    if in_comment == is_start {
                        // Retained comments always come as balanced pairs, so this means the
                        // buffer is inconsistent; stop rather than guess.
                        let kind = if is_start {
                            WarningKind::DoubleCommentStart
                        } else {
                            WarningKind::UnmatchedCommentEnd
                        };
                        self.reporter.warn(Site::bare(index), kind);
                        break;
                    }
                    in_comment = is_start;
                    index += 1;
                }
                TokenKind::Tag if in_comment => index += 1,
                TokenKind::Tag => match self.step(index) {
                    Step::Next => index += 1,
                    Step::Repeat => {}
                },
            }
        }

        if !self.stack.is_empty() {
            log::trace!(
                target: "sanitizer.matcher",
                "{} tags left open at end of input",
                self.stack.len()
            );
        }
        MatchOutcome {
            edits: self.edits,
            unclosed: self.stack.len(),
            max_depth: self.stack.max_depth(),
            scanned: self.stack.scanned(),
        }
    }

    fn step(&mut self, index: usize) -> Step {
        let (config, tokens) = (self.config, self.tokens);
        let token = &tokens[index];
        let name = token.name.as_str();
        let spec = config.tag(name);
        let single = spec.is_some_and(|spec| spec.is_single());
        let site = Site::token(index, token);

        if token.self_closing && token.closing {
            self.reporter.warn(site, WarningKind::BadClosingMarkup);
        } else if token.self_closing && !single {
            self.reporter.warn(site, WarningKind::DisallowedSelfClosing);
        } else if single {
            if token.closing {
                self.reporter.warn(site, WarningKind::ClosingSingleTag);
            } else {
                let rendered = render_opener(&mut self.scope(site), index);
                if let Some(replacement) = rendered {
                    log::trace!(target: "sanitizer.matcher", "token {index}: single <{name}>");
                    self.edits.push(Edit::new(token.span, replacement));
                }
            }
        } else if spec.is_none() {
            self.reporter.warn(site, WarningKind::DisallowedTag);
        } else if !token.closing {
            self.stack.push(OpenTag::new(name, index));
        } else if token.has_attributes(self.reporter.buffer()) {
            self.reporter.warn(site, WarningKind::ClosingTagWithAttributes);
        } else if self.stack.current().is_some_and(|open| open.name == name) {
            if let Some(open) = self.stack.pop() {
                self.match_pair(open.token_index, index);
            }
        } else {
            return self.recover(index);
        }
        Step::Next
    }

    /// Closer that does not match the top of the stack.
    fn recover(&mut self, index: usize) -> Step {
        let tokens = self.tokens;
        let token = &tokens[index];
        match self.stack.pop_above(&token.name) {
            Some(discarded) => {
                let site = Site::pair(
                    index,
                    discarded.first().map(|open| open.token_index),
                    Some(index),
                );
                let discarded = discarded.into_iter().map(|open| open.name).collect();
                self.reporter
                    .warn(site, WarningKind::PrematureClosing { discarded });
                Step::Repeat
            }
            None => {
                self.reporter
                    .warn(Site::token(index, token), WarningKind::NoOpeningTag);
                Step::Next
            }
        }
    }

    /// Validates the closer, then the opener; both are replaced only if both pass.
    fn match_pair(&mut self, opener: usize, closer: usize) {
        let site = Site::pair(closer, Some(opener), Some(closer));
        let mut scope = self.scope(site);
        let Some(closing) = render_closer(&mut scope, closer) else {
            return;
        };
        let Some(opening) = render_opener(&mut scope, opener) else {
            return;
        };
        log::trace!(
            target: "sanitizer.matcher",
            "tokens {opener}..{closer}: matched {opening}...{closing}"
        );
        self.edits.push(Edit::new(self.tokens[closer].span, closing));
        self.edits.push(Edit::new(self.tokens[opener].span, opening));
    }

    fn scope(&mut self, site: Site) -> Scope<'_, 'a> {
        Scope::new(self.config, self.reporter, site)
    }
}
