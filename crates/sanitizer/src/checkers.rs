//! Named value checkers for attribute values and style declarations.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;

use crate::error::ConfigError;
use crate::validate::Scope;

/// Result of a predicate checker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
    /// Accept with a transformed value, which is fed to the next validator.
    Replace(String),
}

pub type Predicate = Arc<dyn Fn(&str, &mut Scope<'_, '_>) -> Verdict + Send + Sync>;

#[derive(Clone)]
pub enum Validator {
    /// Regular expression; see `Validator::pattern` for the accepted syntax.
    Pattern { source: String, regex: Regex },
    Predicate(Predicate),
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Validator::Pattern { source, .. } => f.debug_tuple("Pattern").field(source).finish(),
            Validator::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl Validator {
    /// Compiles a pattern. `~BODY~FLAGS` is a full expression with optional `i m s x`
    /// flags (`u` is accepted and ignored); anything else must match at the start of the
    /// value, i.e. it becomes `^(?:BODY)`.
    pub fn pattern(checker: &str, pattern: &str) -> Result<Self, ConfigError> {
        let expression = match pattern.strip_prefix('~') {
            Some(rest) => {
                let Some(close) = rest.rfind('~') else {
                    return Err(ConfigError::UnterminatedPattern {
                        checker: checker.to_string(),
                        pattern: pattern.to_string(),
                    });
                };
                let mut flags = String::new();
                for flag in rest[close + 1..].chars() {
                    match flag {
                        'i' | 'm' | 's' | 'x' if !flags.contains(flag) => flags.push(flag),
                        'i' | 'm' | 's' | 'x' | 'u' => {}
                        other => {
                            return Err(ConfigError::UnsupportedPatternFlag {
                                checker: checker.to_string(),
                                flag: other,
                            });
                        }
                    }
                }
                let body = &rest[..close];
                if flags.is_empty() {
                    body.to_string()
                } else {
                    format!("(?{flags}){body}")
                }
            }
            None => format!("^(?:{pattern})"),
        };
        let regex = Regex::new(&expression).map_err(|source| ConfigError::InvalidPattern {
            checker: checker.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Validator::Pattern {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn predicate(
        f: impl Fn(&str, &mut Scope<'_, '_>) -> Verdict + Send + Sync + 'static,
    ) -> Self {
        Validator::Predicate(Arc::new(f))
    }
}

/// Ordered validators; a value must pass every one of them.
#[derive(Clone, Debug, Default)]
pub struct Checker {
    validators: Vec<Validator>,
}

impl Checker {
    pub fn new(validators: Vec<Validator>) -> Self {
        Self { validators }
    }

    pub fn patterns(name: &str, patterns: &[&str]) -> Result<Self, ConfigError> {
        patterns
            .iter()
            .map(|pattern| Validator::pattern(name, pattern))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Runs all validators in order. Returns the accepted (possibly replaced) value or the
    /// reason for rejection.
    pub(crate) fn run(
        &self,
        name: &str,
        value: &str,
        scope: &mut Scope<'_, '_>,
    ) -> Result<String, String> {
        let mut current = value.to_string();
        for validator in &self.validators {
            match validator {
                Validator::Pattern { source, regex } => {
                    if !regex.is_match(&current) {
                        return Err(format!("value mismatching {source}"));
                    }
                }
                Validator::Predicate(predicate) => match predicate(&current, scope) {
                    Verdict::Accept => {}
                    Verdict::Reject => return Err(format!("rejected by checker \"{name}\"")),
                    Verdict::Replace(replacement) => current = replacement,
                },
            }
        }
        Ok(current)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CheckerRegistry {
    checkers: BTreeMap<String, Checker>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, checker: Checker) -> Option<Checker> {
        self.checkers.insert(name.into(), checker)
    }

    pub fn insert_patterns(&mut self, name: &str, patterns: &[&str]) -> Result<(), ConfigError> {
        let checker = Checker::patterns(name, patterns)?;
        self.checkers.insert(name.to_string(), checker);
        Ok(())
    }

    pub fn insert_predicate(
        &mut self,
        name: &str,
        f: impl Fn(&str, &mut Scope<'_, '_>) -> Verdict + Send + Sync + 'static,
    ) {
        self.checkers
            .insert(name.to_string(), Checker::new(vec![Validator::predicate(f)]));
    }

    pub fn get(&self, name: &str) -> Option<&Checker> {
        self.checkers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checkers.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Checker> {
        self.checkers.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checkers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SanitizerConfig;
    use crate::validate::with_detached_scope;

    fn run(checker: &Checker, value: &str) -> Result<String, String> {
        let config = SanitizerConfig::empty();
        with_detached_scope(&config, |scope| checker.run("test", value, scope))
    }

    #[test]
    fn plain_patterns_are_anchored_at_start_only() {
        let checker = Checker::patterns("url", &["((https?|ftp)://|/[^\\\\/]|#)"]).unwrap();
        assert!(run(&checker, "https://example.com").is_ok());
        assert!(run(&checker, "#top").is_ok());
        assert!(run(&checker, "/path").is_ok());
        assert!(run(&checker, "//evil.example").is_err());
        assert!(run(&checker, "javascript:alert(1)").is_err());
        assert!(run(&checker, " https://x").is_err());
    }

    #[test]
    fn all_validators_must_accept() {
        let checker =
            Checker::patterns("url", &["((https?|ftp)://|/[^\\\\/]|#)", "[^\\\\]+$"]).unwrap();
        assert!(run(&checker, "http://a/b").is_ok());
        assert_eq!(
            run(&checker, "http://a\\b"),
            Err("value mismatching [^\\\\]+$".to_string())
        );
    }

    #[test]
    fn full_patterns_take_flags() {
        let checker = Checker::patterns("yes", &["~^(yes|no)$~i"]).unwrap();
        assert!(run(&checker, "YES").is_ok());
        assert!(run(&checker, "maybe").is_err());
        let unanchored = Checker::patterns("digit", &["~\\d~"]).unwrap();
        assert!(run(&unanchored, "abc1").is_ok());
    }

    #[test]
    fn pattern_errors_are_reported() {
        assert!(matches!(
            Validator::pattern("bad", "(unclosed"),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            Validator::pattern("bad", "~abc"),
            Err(ConfigError::UnterminatedPattern { .. })
        ));
        assert!(matches!(
            Validator::pattern("bad", "~abc~g"),
            Err(ConfigError::UnsupportedPatternFlag { flag: 'g', .. })
        ));
    }

    #[test]
    fn predicates_can_replace_and_chain() {
        let checker = Checker::new(vec![
            Validator::predicate(|value, _| Verdict::Replace(value.trim().to_string())),
            Validator::pattern("chain", "~^[a-z]+$~").unwrap(),
        ]);
        assert_eq!(run(&checker, "  word "), Ok("word".to_string()));
        let rejecting = Checker::new(vec![Validator::predicate(|_, _| Verdict::Reject)]);
        assert_eq!(
            run(&rejecting, "x"),
            Err("rejected by checker \"test\"".to_string())
        );
    }

    #[test]
    fn registry_lookup() {
        let mut registry = CheckerRegistry::new();
        registry.insert_patterns("lang2", &["\\w\\w$"]).unwrap();
        registry.insert_predicate("any", |_, _| Verdict::Accept);
        assert!(registry.contains("lang2"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["any", "lang2"]);
        assert!(registry.remove("any").is_some());
        assert!(registry.get("any").is_none());
    }
}
