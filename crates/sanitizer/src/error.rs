//! Error types.
//!
//! Only two things can fail: decoding the input bytes (fatal, no output) and
//! building a configuration. Markup problems are reported as warnings.

/// Input bytes were not valid UTF-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingError {
    /// Length of the longest valid UTF-8 prefix.
    pub valid_up_to: usize,
    /// Length of the invalid sequence, `None` when the input ends mid-sequence.
    pub error_len: Option<usize>,
}

impl From<std::str::Utf8Error> for EncodingError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self {
            valid_up_to: err.valid_up_to(),
            error_len: err.error_len(),
        }
    }
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.error_len {
            Some(len) => write!(
                f,
                "input is not valid UTF-8: invalid {len}-byte sequence at byte {}",
                self.valid_up_to
            ),
            None => write!(
                f,
                "input is not valid UTF-8: truncated sequence at byte {}",
                self.valid_up_to
            ),
        }
    }
}

impl std::error::Error for EncodingError {}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPattern {
        checker: String,
        pattern: String,
        source: regex::Error,
    },
    UnterminatedPattern {
        checker: String,
        pattern: String,
    },
    UnsupportedPatternFlag {
        checker: String,
        flag: char,
    },
    EmptyRule,
    InvalidRuleName {
        rule: String,
    },
    InvalidTagName {
        name: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPattern {
                checker,
                pattern,
                source,
            } => write!(f, "checker \"{checker}\" has invalid pattern {pattern:?}: {source}"),
            ConfigError::UnterminatedPattern { checker, pattern } => {
                write!(f, "checker \"{checker}\" pattern {pattern:?} lacks a closing ~")
            }
            ConfigError::UnsupportedPatternFlag { checker, flag } => {
                write!(f, "checker \"{checker}\" uses unsupported pattern flag {flag:?}")
            }
            ConfigError::EmptyRule => f.write_str("empty rule string"),
            ConfigError::InvalidRuleName { rule } => {
                write!(f, "rule {rule:?} has an invalid attribute name")
            }
            ConfigError::InvalidTagName { name } => {
                write!(f, "tag name {name:?} must be ASCII alphanumeric")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}
