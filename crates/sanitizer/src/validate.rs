//! Validation of one tag occurrence: alias resolution, attribute filtering, required
//! attributes and rendering of the replacement markup.

use crate::attr_map::{MapSyntax, parse_map};
use crate::config::SanitizerConfig;
use crate::diagnostics::{Reporter, Site, Warning, WarningKind};
use crate::entities::{decode_entities, encode_attribute};
use crate::prepare::{SourceMap, unprotect};
use crate::rules::{Rule, TagSpec, find_rule};

/// Context handed to checkers: the configuration and the warning sink of the tag occurrence
/// being validated.
pub struct Scope<'s, 'a> {
    config: &'a SanitizerConfig,
    reporter: &'s mut Reporter<'a>,
    site: Site,
}

pub(crate) enum CheckOutcome {
    Accepted(String),
    Rejected(String),
    Undefined,
}

impl<'s, 'a> Scope<'s, 'a> {
    pub(crate) fn new(
        config: &'a SanitizerConfig,
        reporter: &'s mut Reporter<'a>,
        site: Site,
    ) -> Self {
        Self {
            config,
            reporter,
            site,
        }
    }

    pub fn config(&self) -> &'a SanitizerConfig {
        self.config
    }

    /// Cleans an inline style declaration list against `css_properties`.
    pub fn clean_css(&mut self, style: &str) -> String {
        crate::css::clean_declarations(style, self)
    }

    pub(crate) fn warn(&mut self, kind: WarningKind) {
        self.reporter.warn(self.site, kind);
    }

    /// Runs the named checker over `value`.
    pub(crate) fn check(&mut self, checker: &str, value: &str) -> CheckOutcome {
        let config = self.config;
        match config.checkers.get(checker) {
            None => CheckOutcome::Undefined,
            Some(found) => match found.run(checker, value, self) {
                Ok(accepted) => CheckOutcome::Accepted(accepted),
                Err(reason) => CheckOutcome::Rejected(reason),
            },
        }
    }
}

/// Runs `f` with a scope that is not tied to any token; used for standalone style cleaning.
pub(crate) fn detached<R>(
    config: &SanitizerConfig,
    f: impl FnOnce(&mut Scope<'_, '_>) -> R,
) -> (R, Vec<Warning>) {
    let map = SourceMap::default();
    let mut reporter = Reporter::new("", &[], &map, config.collect_warnings);
    let result = f(&mut Scope::new(config, &mut reporter, Site::bare(0)));
    (result, reporter.finish())
}

#[cfg(test)]
pub(crate) fn with_detached_scope<R>(
    config: &SanitizerConfig,
    f: impl FnOnce(&mut Scope<'_, '_>) -> R,
) -> R {
    detached(config, f).0
}

/// Follows aliases from `name` to a rule list. Returns the emitted tag name and its rules.
fn resolve<'a>(scope: &mut Scope<'_, 'a>, name: &str) -> Option<(&'a str, &'a [Rule])> {
    let config = scope.config;
    let (mut current, mut spec) = config.tags.get_key_value(name)?;
    let mut seen: Vec<&str> = Vec::new();

    loop {
        match spec {
            TagSpec::Rules(rules) | TagSpec::Single(rules) => {
                return Some((current.as_str(), rules.as_slice()));
            }
            TagSpec::Alias(target) => {
                if seen.contains(&current.as_str()) {
                    scope.warn(WarningKind::RecursiveAlias {
                        tag: current.clone(),
                    });
                    return None;
                }
                seen.push(current.as_str());
                match config.tags.get_key_value(target.as_str()) {
                    Some((next, next_spec)) => {
                        current = next;
                        spec = next_spec;
                    }
                    None => {
                        scope.warn(WarningKind::UnknownAlias {
                            alias: current.clone(),
                            target: target.clone(),
                        });
                        return None;
                    }
                }
            }
        }
    }
}

/// `</resolved>` for a closing occurrence.
pub(crate) fn render_closer(scope: &mut Scope<'_, '_>, token_index: usize) -> Option<String> {
    let token = scope.reporter.token(token_index);
    let (name, _) = resolve(scope, &token.name)?;
    Some(format!("</{name}>"))
}

/// `<resolved attr="value" ...>` for an opening or single occurrence, or `None` when the
/// tag has to stay escaped.
pub(crate) fn render_opener(scope: &mut Scope<'_, '_>, token_index: usize) -> Option<String> {
    let token = scope.reporter.token(token_index);
    let (name, rules) = resolve(scope, &token.name)?;
    let raw = unprotect(token.attr_text(scope.reporter.buffer()));
    let attrs = filter_attributes(scope, rules, &raw);

    if let Some(rule) = rules
        .iter()
        .find(|rule| rule.required && !attrs.iter().any(|(attr, _)| *attr == rule.name))
    {
        scope.warn(WarningKind::MissingRequired {
            attribute: rule.name.clone(),
        });
        return None;
    }

    let mut out = String::with_capacity(name.len() + 2 + attrs.len() * 16);
    out.push('<');
    out.push_str(name);
    for (attr, value) in &attrs {
        out.push(' ');
        out.push_str(attr);
        out.push('=');
        out.push_str(value);
    }
    out.push('>');
    Some(out)
}

/// Keeps the attributes allowed by `rules` (then the global rules) whose values pass their
/// checkers. Values come back ready to emit, quotes included.
fn filter_attributes(
    scope: &mut Scope<'_, '_>,
    rules: &[Rule],
    text: &str,
) -> Vec<(String, String)> {
    let config = scope.config;
    let parsed = parse_map(text, MapSyntax::Attributes, |key| {
        scope.warn(WarningKind::BadKeyName {
            key: key.to_string(),
        })
    });
    let entries = match parsed {
        Ok(entries) => entries,
        Err(_) => {
            scope.warn(WarningKind::UnterminatedString {
                text: text.to_string(),
            });
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(entries.len());
    for (attr, value) in entries {
        let rule = find_rule(rules, &attr).or_else(|| find_rule(&config.global_rules, &attr));
        let Some(rule) = rule else {
            scope.warn(WarningKind::DisallowedAttribute {
                attribute: attr,
                value: value.unwrap_or_default(),
            });
            continue;
        };
        if let Some(value) = attribute_value(scope, rule, &attr, value) {
            out.push((attr, value));
        }
    }
    out
}

fn attribute_value(
    scope: &mut Scope<'_, '_>,
    rule: &Rule,
    attr: &str,
    value: Option<String>,
) -> Option<String> {
    // `<input disabled>` and `<a title=>`.
    let value = match value {
        None => attr.to_string(),
        Some(value) if value.is_empty() => "\"\"".to_string(),
        Some(value) => value,
    };

    let (quoted, decoded) = match value.as_bytes()[0] {
        quote @ (b'"' | b'\'') => {
            let close = memchr::memchr(quote, &value.as_bytes()[1..])
                .map_or(value.len() - 1, |rel| rel + 1);
            let quoted = &value[..=close];
            if quoted.len() != value.len() {
                scope.warn(WarningKind::AttributeValueTail {
                    value: value.clone(),
                });
            }
            (Some(quoted.to_string()), None)
        }
        _ => (None, Some(decode_entities(&value))),
    };

    let Some(checker) = &rule.checker else {
        return Some(match (quoted, decoded) {
            (Some(quoted), _) => quoted,
            (None, decoded) => {
                format!("\"{}\"", encode_attribute(&decoded.unwrap_or_default()))
            }
        });
    };

    let decoded = match (decoded, &quoted) {
        (Some(decoded), _) => decoded,
        (None, Some(quoted)) => decode_entities(&quoted[1..quoted.len() - 1]),
        (None, None) => String::new(),
    };
    match scope.check(checker, &decoded) {
        CheckOutcome::Accepted(accepted) => Some(format!("\"{}\"", encode_attribute(&accepted))),
        CheckOutcome::Rejected(reason) => {
            scope.warn(WarningKind::BadAttributeValue {
                attribute: attr.to_string(),
                value: decoded,
                reason,
            });
            None
        }
        CheckOutcome::Undefined => {
            scope.warn(WarningKind::UndefinedChecker {
                checker: checker.clone(),
                name: attr.to_string(),
            });
            None
        }
    }
}
