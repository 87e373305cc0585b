//! Glob-style name matching for attribute and style property rules.
//!
//! `*` matches any run of bytes (including none), `?` matches exactly one byte, every other
//! byte matches itself case-sensitively. Names are ASCII, so byte matching is sufficient.

pub(crate) fn has_wildcard(pattern: &str) -> bool {
    memchr::memchr2(b'*', b'?', pattern.as_bytes()).is_some()
}

/// Iterative matcher; backtracks only to the most recent `*`, so it runs in
/// `O(pattern * name)` worst case.
pub(crate) fn matches(pattern: &str, name: &str) -> bool {
    let pattern = pattern.as_bytes();
    let name = name.as_bytes();
    let (mut p, mut n) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some((p, n));
                p += 1;
            }
            Some(b'?') => {
                p += 1;
                n += 1;
            }
            Some(&b) if b == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((star_p, star_n)) => {
                    p = star_p + 1;
                    n = star_n + 1;
                    star = Some((star_p, star_n + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

#[cfg(test)]
mod tests {
    use super::{has_wildcard, matches};

    #[test]
    fn literal_patterns_match_exactly() {
        assert!(matches("color", "color"));
        assert!(!matches("color", "colors"));
        assert!(!matches("color", "Color"));
    }

    #[test]
    fn star_matches_any_suffix_or_infix() {
        assert!(matches("data-*", "data-"));
        assert!(matches("data-*", "data-user-id"));
        assert!(!matches("data-*", "data"));
        assert!(matches("background*", "background"));
        assert!(matches("background*", "background-color"));
        assert!(matches("b*r*r", "border-right-color-r"));
        assert!(matches("*", ""));
    }

    #[test]
    fn question_mark_matches_one_byte() {
        assert!(matches("h?", "h1"));
        assert!(!matches("h?", "h"));
        assert!(!matches("h?", "h10"));
        assert!(matches("?*x", "ax"));
    }

    #[test]
    fn backtracking_recovers_from_partial_matches() {
        assert!(matches("*-width", "border-left-width"));
        assert!(!matches("*-width", "border-left-widths"));
        assert!(matches("a*b*c", "aXbYbZc"));
    }

    #[test]
    fn detects_wildcards() {
        assert!(has_wildcard("text-*"));
        assert!(has_wildcard("h?"));
        assert!(!has_wildcard("title"));
    }
}
