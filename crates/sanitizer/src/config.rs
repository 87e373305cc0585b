//! Sanitizer configuration.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::checkers::CheckerRegistry;
use crate::error::ConfigError;
use crate::rules::{Rule, TagSpec, normalize_tag_name, parse_rules};

/// What happens to `<!-- ... -->` comments in the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommentPolicy {
    #[default]
    Strip,
    /// Keep comments in the output with their content escaped; tags inside are ignored.
    Retain,
}

/// Line break handling applied to the final output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineBreaks {
    Keep,
    /// Replace every `\r\n`, `\r` and `\n` with the given string.
    Replace(String),
}

impl Default for LineBreaks {
    fn default() -> Self {
        LineBreaks::Replace("\n".to_string())
    }
}

/// Allow-lists, checkers and output options.
///
/// `Default` is the standard policy (see `defaults.rs`); `empty()` admits nothing.
#[derive(Clone, Debug)]
pub struct SanitizerConfig {
    /// Lower-cased tag name to its spec.
    pub tags: BTreeMap<String, TagSpec>,
    /// Rules applied to every tag after its own rules. Never required.
    pub global_rules: Vec<Rule>,
    pub checkers: CheckerRegistry,
    /// Rules for declarations inside the style attribute.
    pub css_properties: Vec<Rule>,
    pub line_breaks: LineBreaks,
    pub comments: CommentPolicy,
    /// When false, no warnings are recorded.
    pub collect_warnings: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        crate::defaults::standard_policy().expect("standard policy is valid")
    }
}

static SHARED_DEFAULT: OnceLock<Arc<SanitizerConfig>> = OnceLock::new();

impl SanitizerConfig {
    /// No tags, no checkers: every tag stays escaped.
    pub fn empty() -> Self {
        Self {
            tags: BTreeMap::new(),
            global_rules: Vec::new(),
            checkers: CheckerRegistry::new(),
            css_properties: Vec::new(),
            line_breaks: LineBreaks::default(),
            comments: CommentPolicy::default(),
            collect_warnings: true,
        }
    }

    /// The standard policy, built once per process.
    pub fn shared_default() -> Arc<SanitizerConfig> {
        Arc::clone(SHARED_DEFAULT.get_or_init(|| Arc::new(SanitizerConfig::default())))
    }

    pub fn insert_tag(&mut self, name: &str, spec: TagSpec) -> Result<Option<TagSpec>, ConfigError> {
        let name = normalize_tag_name(name)?;
        if let TagSpec::Alias(target) = &spec {
            normalize_tag_name(target)?;
        }
        Ok(self.tags.insert(name, spec))
    }

    /// Allows a paired tag with the given compact rules.
    pub fn allow_tag(&mut self, name: &str, rules: &[&str]) -> Result<&mut Self, ConfigError> {
        self.insert_tag(name, TagSpec::rules(rules)?)?;
        Ok(self)
    }

    /// Allows a tag without a closer.
    pub fn allow_single(&mut self, name: &str, rules: &[&str]) -> Result<&mut Self, ConfigError> {
        self.insert_tag(name, TagSpec::single(rules)?)?;
        Ok(self)
    }

    pub fn alias(&mut self, name: &str, target: &str) -> Result<&mut Self, ConfigError> {
        self.insert_tag(name, TagSpec::alias(target))?;
        Ok(self)
    }

    pub fn remove_tag(&mut self, name: &str) -> Option<TagSpec> {
        self.tags.remove(&name.to_ascii_lowercase())
    }

    pub fn add_global_rules(&mut self, rules: &[&str]) -> Result<&mut Self, ConfigError> {
        self.global_rules.extend(parse_rules(rules)?);
        Ok(self)
    }

    pub fn add_css_properties(&mut self, rules: &[&str]) -> Result<&mut Self, ConfigError> {
        self.css_properties.extend(parse_rules(rules)?);
        Ok(self)
    }

    pub fn tag(&self, name: &str) -> Option<&TagSpec> {
        self.tags.get(name)
    }

    pub fn is_single(&self, name: &str) -> bool {
        self.tags.get(name).is_some_and(TagSpec::is_single)
    }
}
