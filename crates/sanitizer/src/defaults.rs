//! The standard policy: tag table, global attributes, style properties and checkers.

use crate::checkers::Verdict;
use crate::config::{CommentPolicy, LineBreaks, SanitizerConfig};
use crate::error::ConfigError;
use crate::rules::{TagSpec, parse_rules};

/// Attributes every tag may carry.
pub const GLOBAL_RULES: &[&str] = &[
    "class",
    "dir",
    "id",
    "lang lang2",
    "style css",
    "title",
    "data-*",
];

/// Inline style properties. Duplicates are harmless: lookup stops at the first match.
pub const CSS_PROPERTIES: &[&str] = &[
    "color",
    "background*",
    "border*",
    "box-shadow",
    "clear",
    "display",
    "float",
    "height",
    "overflow*",
    "padding*",
    "width",
    "vertical-align",
    "align-*",
    "flex*",
    "justify-content",
    "margin*",
    "max-height",
    "max-width",
    "min-height",
    "min-width",
    "order",
    "letter-spacing",
    "line-height",
    "tab-size",
    "text-*",
    "white-space",
    "word-*",
    "font*",
    "direction",
    "unicode-bidi",
    "caption-side",
    "empty-cells",
    "table-layout",
    "list-style-*",
    "animation*",
    "backface-visibility",
    "perspective*",
    "transform*",
    "transition*",
    "box-sizing",
    "cursor",
    "icon",
    "outline*",
    "resize",
    "column*",
    "page-break-*",
];

/// Pattern checkers: name and validators, all of which must match.
pub const PATTERN_CHECKERS: &[(&str, &[&str])] = &[
    ("filename", &[r"[\w\- .]+$"]),
    ("lang2", &[r"\w\w$"]),
    ("mime", &[r"[\w-]+/[\w-]+$"]),
    ("datetime", &[r"\d\d\d\d-\d\d-\d\dT\d\d:\d\d:\d\d\w*$"]),
    ("url", &[r"((https?|ftp)://|/[^\\/]|#)", r"[^\\]+$"]),
    (
        "imgurl",
        &[r"((https?|ftp)://|/[^\\/]|data:image/\w+;base64,)", r"[^\\]+$"],
    ),
    ("map", &[r"#[\w\- .]+$"]),
];

enum Entry {
    Paired(&'static [&'static str]),
    Single(&'static [&'static str]),
    Alias(&'static str),
}

use Entry::{Alias, Paired, Single};

const ALIGN: &[&str] = &["align"];
const SECTION: &[&str] = &["align", "valign"];
const CELL: &[&str] = &["align", "colspan", "height", "rowspan", "valign", "width"];
const CITED: &[&str] = &["cite url"];
const EDIT: &[&str] = &["cite url", "datetime datetime"];
const OPEN: &[&str] = &["open"];

const TAGS: &[(&str, Entry)] = &[
    (
        "a",
        Paired(&[
            "download filename",
            "!href url",
            "hreflang lang2",
            "rel",
            "target filename",
            "target filename",
            "type mime",
        ]),
    ),
    ("abbr", Paired(&[])),
    ("acronym", Alias("abbr")),
    ("address", Paired(&[])),
    (
        "area",
        Single(&[
            "alt",
            "!coords",
            "download filename",
            "!href url",
            "hreflang lang2",
            "rel",
            "shape filename",
            "target filename",
            "type mime",
        ]),
    ),
    ("article", Paired(&[])),
    ("aside", Paired(&[])),
    (
        "audio",
        Paired(&["autoplay", "controls", "loop", "muted", "preload", "!src url"]),
    ),
    ("b", Alias("strong")),
    ("bdi", Paired(&[])),
    ("bdo", Paired(&["!dir"])),
    ("big", Paired(&[])),
    ("blockquote", Paired(CITED)),
    ("br", Single(&[])),
    ("caption", Paired(ALIGN)),
    ("center", Paired(&[])),
    ("cite", Paired(&[])),
    ("code", Paired(&[])),
    ("col", Single(&["align", "span", "valign", "width"])),
    ("colgroup", Paired(&["align", "span", "valign", "width"])),
    ("dd", Paired(&[])),
    ("del", Paired(EDIT)),
    ("details", Paired(OPEN)),
    ("dfn", Paired(&[])),
    ("dialog", Paired(OPEN)),
    ("div", Paired(ALIGN)),
    ("dl", Paired(&[])),
    ("dt", Paired(&[])),
    ("em", Paired(&[])),
    ("fieldset", Paired(&["disabled"])),
    ("figcaption", Paired(&[])),
    ("figure", Paired(&[])),
    ("footer", Paired(&[])),
    ("h1", Paired(ALIGN)),
    ("h2", Paired(ALIGN)),
    ("h3", Paired(ALIGN)),
    ("h4", Paired(ALIGN)),
    ("h5", Paired(ALIGN)),
    ("h6", Paired(ALIGN)),
    ("header", Paired(&[])),
    ("hr", Single(&["align", "width"])),
    ("i", Alias("em")),
    (
        "img",
        Single(&["align", "alt", "height", "!src imgurl", "usemap map", "width"]),
    ),
    (
        "input",
        Single(&["align", "disabled", "placeholder", "readonly", "size", "width"]),
    ),
    ("ins", Paired(EDIT)),
    ("kbd", Paired(&[])),
    ("legend", Paired(ALIGN)),
    ("li", Paired(&["type", "value"])),
    ("main", Paired(&[])),
    ("map", Paired(&["!name filename"])),
    ("mark", Paired(&[])),
    (
        "meter",
        Paired(&["high", "low", "max", "min", "optimum", "value"]),
    ),
    ("nav", Paired(&[])),
    ("ol", Paired(&["reversed", "start", "type"])),
    ("p", Paired(ALIGN)),
    ("pre", Paired(&["width"])),
    ("progress", Single(&["!max", "!value"])),
    ("q", Paired(CITED)),
    ("rp", Paired(&[])),
    ("rt", Paired(&[])),
    ("ruby", Paired(&[])),
    ("s", Alias("del")),
    ("samp", Paired(&[])),
    ("section", Paired(&[])),
    ("small", Paired(&[])),
    ("source", Single(&["src url", "type mime"])),
    ("span", Paired(&[])),
    ("strike", Alias("s")),
    ("strong", Paired(&[])),
    ("sub", Paired(&[])),
    ("summary", Paired(&[])),
    ("sup", Paired(&[])),
    ("table", Paired(&["align", "rules", "sortable", "width"])),
    ("tbody", Paired(SECTION)),
    ("td", Paired(CELL)),
    (
        "textarea",
        Paired(&["cols", "disabled", "placeholder", "readonly", "rows", "wrap"]),
    ),
    ("tfoot", Paired(SECTION)),
    ("th", Paired(CELL)),
    ("thead", Paired(SECTION)),
    ("time", Paired(&["datetime datetime"])),
    ("tr", Paired(SECTION)),
    (
        "track",
        Single(&["default", "kind", "label", "!src url", "srclang lang2"]),
    ),
    ("tt", Alias("kbd")),
    ("u", Paired(&[])),
    ("ul", Paired(&["type"])),
    ("var", Paired(&[])),
    (
        "video",
        Paired(&[
            "autoplay",
            "controls",
            "height",
            "loop",
            "poster url",
            "preload",
            "!src url",
            "width",
        ]),
    ),
    ("wbr", Single(&[])),
];

/// Builds the standard policy.
pub fn standard_policy() -> Result<SanitizerConfig, ConfigError> {
    let mut config = SanitizerConfig::empty();

    for (name, entry) in TAGS {
        let spec = match entry {
            Paired(rules) => TagSpec::rules(rules)?,
            Single(rules) => TagSpec::single(rules)?,
            Alias(target) => TagSpec::alias(target),
        };
        config.insert_tag(name, spec)?;
    }
    config.global_rules = parse_rules(GLOBAL_RULES)?;
    config.css_properties = parse_rules(CSS_PROPERTIES)?;

    for (name, patterns) in PATTERN_CHECKERS {
        config.checkers.insert_patterns(name, patterns)?;
    }
    config.checkers.insert_predicate("css", css_checker);

    config.line_breaks = LineBreaks::Replace("\n".to_string());
    config.comments = CommentPolicy::Strip;
    Ok(config)
}

/// Cleans a style attribute; a declaration list with nothing left is rejected.
pub fn css_checker(value: &str, scope: &mut crate::validate::Scope<'_, '_>) -> Verdict {
    let cleaned = scope.clean_css(value);
    if cleaned.is_empty() {
        Verdict::Reject
    } else {
        Verdict::Replace(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::find_rule;

    #[test]
    fn standard_policy_builds() {
        let config = standard_policy().unwrap();
        assert_eq!(config.tags.len(), TAGS.len());
        for name in ["css", "filename", "lang2", "mime", "datetime", "url", "imgurl", "map"] {
            assert!(config.checkers.contains(name), "missing checker {name}");
        }
    }

    #[test]
    fn every_referenced_checker_exists() {
        let config = standard_policy().unwrap();
        let rules = config
            .tags
            .values()
            .flat_map(|spec| match spec {
                TagSpec::Rules(rules) | TagSpec::Single(rules) => rules.as_slice(),
                TagSpec::Alias(_) => &[],
            })
            .chain(config.global_rules.iter())
            .chain(config.css_properties.iter());
        for rule in rules {
            if let Some(checker) = &rule.checker {
                assert!(config.checkers.contains(checker), "rule {rule} uses {checker}");
            }
        }
    }

    #[test]
    fn aliases_resolve_to_rule_lists() {
        let config = standard_policy().unwrap();
        for (name, spec) in &config.tags {
            let mut current = spec;
            let mut hops = 0;
            while let TagSpec::Alias(target) = current {
                hops += 1;
                assert!(hops < 8, "alias chain too long from {name}");
                current = config.tags.get(target).unwrap_or_else(|| {
                    panic!("alias {name} points at unknown {target}")
                });
            }
        }
    }

    #[test]
    fn single_tags_are_flagged() {
        let config = standard_policy().unwrap();
        for name in ["area", "br", "col", "hr", "img", "input", "progress", "source", "track", "wbr"] {
            assert!(config.is_single(name), "{name} should be single");
        }
        assert!(!config.is_single("p"));
    }

    #[test]
    fn wildcard_properties_match() {
        let config = standard_policy().unwrap();
        assert!(find_rule(&config.css_properties, "background-color").is_some());
        assert!(find_rule(&config.css_properties, "text-decoration").is_some());
        assert!(find_rule(&config.css_properties, "position").is_none());
        assert!(find_rule(&config.global_rules, "data-user").is_some());
    }
}
