//! Policy overlays: a TOML file and `--tag` overrides applied on top of a base policy.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sanitizer::{ConfigError, SanitizerConfig};
use serde::Deserialize;

/// ```toml
/// remove = ["img"]
/// global_rules = ["aria-*"]
/// css_properties = ["transform"]
///
/// [tags]
/// iframe = ["!src url", "width", "height"]
///
/// [single]
/// embed = ["!src url"]
///
/// [aliases]
/// strike = "del"
///
/// [checkers]
/// youtube = ["https://www\\.youtube\\.com/embed/"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    #[serde(default)]
    pub remove: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub single: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub global_rules: Vec<String>,
    #[serde(default)]
    pub css_properties: Vec<String>,
    /// Pattern checkers by name; all patterns must match.
    #[serde(default)]
    pub checkers: BTreeMap<String, Vec<String>>,
}

#[derive(Debug)]
pub enum PolicyError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Config(ConfigError),
    BadTagOverride(String),
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::Read { path, source } => {
                write!(f, "cannot read policy {}: {source}", path.display())
            }
            PolicyError::Parse { path, source } => {
                write!(f, "invalid policy {}: {source}", path.display())
            }
            PolicyError::Config(err) => write!(f, "invalid policy: {err}"),
            PolicyError::BadTagOverride(raw) => {
                write!(f, "invalid --tag value \"{raw}\" (expected NAME or NAME=RULE,RULE)")
            }
        }
    }
}

impl std::error::Error for PolicyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PolicyError::Read { source, .. } => Some(source),
            PolicyError::Parse { source, .. } => Some(source),
            PolicyError::Config(err) => Some(err),
            PolicyError::BadTagOverride(_) => None,
        }
    }
}

impl From<ConfigError> for PolicyError {
    fn from(err: ConfigError) -> Self {
        PolicyError::Config(err)
    }
}

impl PolicyFile {
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| PolicyError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Removals first, then additions, so a file can replace a tag by removing and
    /// re-adding it.
    pub fn apply(&self, config: &mut SanitizerConfig) -> Result<(), PolicyError> {
        for name in &self.remove {
            if config.remove_tag(name).is_none() {
                tracing::warn!(target: "tagsafe.policy", "remove: tag {name} is not in the policy");
            }
        }
        for (name, rules) in &self.tags {
            config.allow_tag(name, &as_strs(rules))?;
        }
        for (name, rules) in &self.single {
            config.allow_single(name, &as_strs(rules))?;
        }
        for (name, target) in &self.aliases {
            config.alias(name, target)?;
        }
        config.add_global_rules(&as_strs(&self.global_rules))?;
        config.add_css_properties(&as_strs(&self.css_properties))?;
        for (name, patterns) in &self.checkers {
            config.checkers.insert_patterns(name, &as_strs(patterns))?;
        }
        tracing::debug!(
            target: "tagsafe.policy",
            "overlay: -{} tags, +{} tags, +{} single, +{} aliases, +{} checkers",
            self.remove.len(),
            self.tags.len(),
            self.single.len(),
            self.aliases.len(),
            self.checkers.len()
        );
        Ok(())
    }
}

/// Applies one `--tag NAME=RULE,RULE` override; a bare `NAME` allows the tag without
/// attributes of its own.
pub fn apply_tag_override(raw: &str, config: &mut SanitizerConfig) -> Result<(), PolicyError> {
    let (name, rules) = raw.split_once('=').unwrap_or((raw, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err(PolicyError::BadTagOverride(raw.to_string()));
    }
    let rules: Vec<&str> = rules
        .split(',')
        .map(str::trim)
        .filter(|rule| !rule.is_empty())
        .collect();
    config.allow_tag(name, &rules)?;
    Ok(())
}

fn as_strs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(text: &str) -> SanitizerConfig {
        let file: PolicyFile = toml::from_str(text).unwrap();
        let mut config = SanitizerConfig::default();
        file.apply(&mut config).unwrap();
        config
    }

    #[test]
    fn overlay_adds_and_removes_tags() {
        let config = overlay(
            r#"
            remove = ["img"]
            [tags]
            iframe = ["!src yt"]
            [single]
            embed = []
            [checkers]
            yt = ["https://www\\.youtube\\.com/embed/"]
            "#,
        );
        assert!(config.tag("img").is_none());
        assert!(config.tag("iframe").is_some());
        assert!(config.is_single("embed"));
        assert!(config.checkers.contains("yt"));

        let out = sanitizer::sanitize(
            br#"<iframe src="https://www.youtube.com/embed/x"></iframe><img src="/a.png">"#,
            &config,
        )
        .unwrap();
        assert_eq!(
            out.output,
            r#"<iframe src="https://www.youtube.com/embed/x"></iframe>&lt;img src="/a.png"&gt;"#
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<PolicyFile>("allow = [\"x\"]").is_err());
    }

    #[test]
    fn invalid_checker_pattern_is_a_config_error() {
        let file: PolicyFile = toml::from_str("[checkers]\nbad = [\"(\"]").unwrap();
        let err = file.apply(&mut SanitizerConfig::default()).unwrap_err();
        assert!(matches!(err, PolicyError::Config(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn tag_override_forms() {
        let mut config = SanitizerConfig::empty();
        apply_tag_override("mark", &mut config).unwrap();
        apply_tag_override("abbr = title, !lang", &mut config).unwrap();
        assert!(config.tag("mark").is_some());
        let out = sanitizer::sanitize(b"<abbr title=t>x</abbr><mark>y</mark>", &config).unwrap();
        assert_eq!(out.output, "&lt;abbr title=t&gt;x&lt;/abbr&gt;<mark>y</mark>");
        assert!(apply_tag_override("=title", &mut config).is_err());
    }
}
