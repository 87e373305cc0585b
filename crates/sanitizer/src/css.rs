//! Inline style cleaning.

use crate::attr_map::{MapSyntax, parse_map};
use crate::config::SanitizerConfig;
use crate::diagnostics::{Warning, WarningKind};
use crate::rules::find_rule;
use crate::validate::{CheckOutcome, Scope, detached};

/// Cleans a `prop: value; ...` list against the configured style properties.
///
/// Returns the surviving declarations joined as `prop: value; prop: value` together with the
/// warnings raised for the ones that were dropped. An empty string means nothing survived.
pub fn clean_css(style: &str, config: &SanitizerConfig) -> (String, Vec<Warning>) {
    detached(config, |scope| clean_declarations(style, scope))
}

pub(crate) fn clean_declarations(style: &str, scope: &mut Scope<'_, '_>) -> String {
    let config = scope.config();
    let parsed = parse_map(style, MapSyntax::Declarations, |key| {
        scope.warn(WarningKind::BadKeyName {
            key: key.to_string(),
        })
    });
    let declarations = match parsed {
        Ok(declarations) => declarations,
        Err(_) => {
            scope.warn(WarningKind::UnterminatedString {
                text: style.to_string(),
            });
            return String::new();
        }
    };

    let mut out = String::with_capacity(style.len());
    for (property, value) in declarations {
        // `a: b; this; d: e` and `a: b; this: ; d: e`.
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            continue;
        };
        let Some(rule) = find_rule(&config.css_properties, &property) else {
            scope.warn(WarningKind::DisallowedStyleProperty { property, value });
            continue;
        };
        let value = match &rule.checker {
            None => value,
            Some(checker) => match scope.check(checker, &value) {
                CheckOutcome::Accepted(accepted) => accepted,
                CheckOutcome::Rejected(reason) => {
                    scope.warn(WarningKind::BadStyle {
                        property,
                        value,
                        reason,
                    });
                    continue;
                }
                CheckOutcome::Undefined => {
                    scope.warn(WarningKind::UndefinedChecker {
                        checker: checker.clone(),
                        name: property,
                    });
                    continue;
                }
            },
        };

        if !out.is_empty() {
            out.push_str("; ");
        }
        out.push_str(&property);
        out.push_str(": ");
        out.push_str(&value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(warnings: &[Warning]) -> Vec<String> {
        warnings.iter().map(Warning::message).collect()
    }

    #[test]
    fn keeps_only_allowed_declarations() {
        let config = SanitizerConfig::default();
        let (css, warnings) = clean_css(
            "Color:red;position:absolute; BACKGROUND-color : #fff ;z-index: 9",
            &config,
        );
        assert_eq!(css, "color: red; background-color: #fff");
        assert_eq!(
            messages(&warnings),
            vec![
                r#"disallowed style property "position": "absolute" - property discarded"#,
                r#"disallowed style property "z-index": "9" - property discarded"#,
            ]
        );
    }

    #[test]
    fn skips_declarations_without_value_silently() {
        let config = SanitizerConfig::default();
        let (css, warnings) = clean_css("color:; width; ;height: 1em", &config);
        assert_eq!(css, "height: 1em");
        assert!(warnings.is_empty());
    }

    #[test]
    fn nothing_allowed_yields_empty_string() {
        let config = SanitizerConfig::default();
        let (css, warnings) = clean_css("position: fixed", &config);
        assert!(css.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn quoted_values_keep_separators() {
        let config = SanitizerConfig::default();
        let (css, _) = clean_css(r#"font-family: "a;b", serif; color: blue"#, &config);
        assert_eq!(css, r#"font-family: "a;b", serif; color: blue"#);
    }

    #[test]
    fn unterminated_string_drops_the_whole_style() {
        let config = SanitizerConfig::default();
        let (css, warnings) = clean_css("color: red; font-family: 'x", &config);
        assert!(css.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message().starts_with("token contains unterminated string"));
    }

    #[test]
    fn property_checkers_apply() {
        let mut config = SanitizerConfig::empty();
        config.add_css_properties(&["color hex", "width"]).unwrap();
        config
            .checkers
            .insert_patterns("hex", &["#[0-9a-f]{3,6}$"])
            .unwrap();
        let (css, warnings) = clean_css("color: red; width: 2px; color: #abc", &config);
        assert_eq!(css, "color: #abc; width: 2px");
        assert!(warnings.is_empty());
        let (css, warnings) = clean_css("color: red", &config);
        assert!(css.is_empty());
        assert_eq!(
            messages(&warnings),
            vec![r#"bad style of "color": "red" (value mismatching #[0-9a-f]{3,6}$) - property discarded"#]
        );
    }

    #[test]
    fn bad_property_names_are_reported() {
        let config = SanitizerConfig::default();
        let (css, warnings) = clean_css("col*or: red; color: blue", &config);
        assert_eq!(css, "color: blue");
        assert_eq!(
            messages(&warnings),
            vec![r#"bad attribute key name "col*or" - attribute discarded"#]
        );
    }
}
