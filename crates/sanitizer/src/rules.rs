//! Attribute/property rules and tag specifications.

use crate::error::ConfigError;
use crate::wildcard;

/// One allow-list entry: `[!]NAME[ CHECKER]`.
///
/// NAME may contain `*`/`?` wildcards and is matched case-sensitively against the
/// lower-cased attribute (or style property) name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub checker: Option<String>,
    pub required: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checker: None,
            required: false,
        }
    }

    pub fn checked(mut self, checker: impl Into<String>) -> Self {
        self.checker = Some(checker.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Parses the compact `[!]NAME[ CHECKER]` form.
    pub fn parse(rule: &str) -> Result<Self, ConfigError> {
        let rule = rule.trim();
        if rule.is_empty() {
            return Err(ConfigError::EmptyRule);
        }
        let (required, rest) = match rule.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, rule),
        };
        let (name, checker) = match rest.split_once(|c: char| c.is_ascii_whitespace()) {
            Some((name, checker)) => (name, Some(checker.trim())),
            None => (rest, None),
        };
        let valid_name = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'*' | b'?'));
        if !valid_name {
            return Err(ConfigError::InvalidRuleName {
                rule: rule.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            checker: checker.filter(|c| !c.is_empty()).map(str::to_string),
            required,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        if wildcard::has_wildcard(&self.name) {
            wildcard::matches(&self.name, name)
        } else {
            self.name == name
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.required {
            f.write_str("!")?;
        }
        f.write_str(&self.name)?;
        if let Some(checker) = &self.checker {
            write!(f, " {checker}")?;
        }
        Ok(())
    }
}

/// Parses a list of compact rule strings.
pub fn parse_rules(rules: &[&str]) -> Result<Vec<Rule>, ConfigError> {
    rules.iter().map(|rule| Rule::parse(rule)).collect()
}

/// First rule in `rules` whose name pattern matches `name`.
pub fn find_rule<'r>(rules: &'r [Rule], name: &str) -> Option<&'r Rule> {
    rules.iter().find(|rule| rule.matches(name))
}

/// How a tag name is admitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagSpec {
    /// Paired tag with its permitted attributes.
    Rules(Vec<Rule>),
    /// Tag without a closer (`<br>`); validated where it occurs, never stacked.
    Single(Vec<Rule>),
    /// Same rules as the named tag, which is also emitted in its place.
    Alias(String),
}

impl TagSpec {
    pub fn rules(rules: &[&str]) -> Result<Self, ConfigError> {
        parse_rules(rules).map(TagSpec::Rules)
    }

    pub fn single(rules: &[&str]) -> Result<Self, ConfigError> {
        parse_rules(rules).map(TagSpec::Single)
    }

    pub fn alias(target: &str) -> Self {
        TagSpec::Alias(target.to_ascii_lowercase())
    }

    pub fn is_single(&self) -> bool {
        matches!(self, TagSpec::Single(_))
    }
}

/// Tag names are stored lower-cased and must match the tokenizer's `[A-Za-z0-9]+`.
pub(crate) fn normalize_tag_name(name: &str) -> Result<String, ConfigError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidTagName {
            name: name.to_string(),
        });
    }
    Ok(name.to_ascii_lowercase())
}
