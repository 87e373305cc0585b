//! Quote-aware `key=value` / `prop: value` splitter.
//!
//! Quoted substrings are blanked before splitting so separators inside quotes are not
//! structural. HTML and CSS have no backslash escapes inside quotes, which keeps this to a
//! plain scan for the matching quote.

use crate::tokenizer::is_space;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MapSyntax {
    /// Whitespace-separated `name=value` attributes.
    Attributes,
    /// `;`-separated `property: value` declarations.
    Declarations,
}

impl MapSyntax {
    fn is_item_separator(self, b: u8) -> bool {
        match self {
            MapSyntax::Attributes => is_space(b),
            MapSyntax::Declarations => b == b';',
        }
    }

    fn key_separator(self) -> u8 {
        match self {
            MapSyntax::Attributes => b'=',
            MapSyntax::Declarations => b':',
        }
    }
}

/// One parsed item: the lower-cased key and the raw (trimmed, still quoted) value.
/// `None` means the item had no key separator.
pub(crate) type MapEntry = (String, Option<String>);

/// A quote was opened but never closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Unterminated;

/// Splits `text` into ordered entries. Keys containing bytes outside `[A-Za-z0-9_-]` are
/// reported through `bad_key` and skipped; a repeated key keeps its first position and
/// takes the last value.
pub(crate) fn parse_map(
    text: &str,
    syntax: MapSyntax,
    mut bad_key: impl FnMut(&str),
) -> Result<Vec<MapEntry>, Unterminated> {
    let flat = blank_quotes(text)?;
    let mut entries: Vec<MapEntry> = Vec::new();
    let mut start = 0;

    while start <= flat.len() {
        let end = flat[start..]
            .iter()
            .position(|&b| syntax.is_item_separator(b))
            .map_or(flat.len(), |rel| start + rel);
        let item = &flat[start..end];
        let key_end = item.iter().position(|&b| b == syntax.key_separator());
        let key = trim(&text[start..start + key_end.unwrap_or(item.len())]);

        if key.is_empty() {
            if key_end.is_some() {
                bad_key(key);
            }
        } else if !key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            bad_key(key);
        } else {
            let key = key.to_ascii_lowercase();
            let value = key_end.map(|k| trim(&text[start + k + 1..end]).to_string());
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }

        start = end + 1;
    }

    Ok(entries)
}

/// Copy of `text` with every quoted run (quotes included) replaced by `_`.
fn blank_quotes(text: &str) -> Result<Vec<u8>, Unterminated> {
    let mut flat = text.as_bytes().to_vec();
    let mut i = 0;
    while let Some(rel) = memchr::memchr2(b'"', b'\'', &flat[i..]) {
        let open = i + rel;
        let quote = flat[open];
        let close = memchr::memchr(quote, &flat[open + 1..])
            .map(|rel| open + 1 + rel)
            .ok_or(Unterminated)?;
        flat[open..=close].fill(b'_');
        i = close + 1;
    }
    Ok(flat)
}

fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii() && is_space(c as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, syntax: MapSyntax) -> (Result<Vec<MapEntry>, Unterminated>, Vec<String>) {
        let mut bad = Vec::new();
        let result = parse_map(text, syntax, |key| bad.push(key.to_string()));
        (result, bad)
    }

    fn entry(key: &str, value: Option<&str>) -> MapEntry {
        (key.to_string(), value.map(str::to_string))
    }

    #[test]
    fn splits_attributes_with_quoted_separators() {
        let (map, bad) = parse(r#" href="a b=c" title='x y' disabled"#, MapSyntax::Attributes);
        assert_eq!(
            map.unwrap(),
            vec![
                entry("href", Some("\"a b=c\"")),
                entry("title", Some("'x y'")),
                entry("disabled", None),
            ]
        );
        assert!(bad.is_empty());
    }

    #[test]
    fn empty_value_is_distinct_from_missing_value() {
        let (map, _) = parse(" title= alt", MapSyntax::Attributes);
        assert_eq!(map.unwrap(), vec![entry("title", Some("")), entry("alt", None)]);
    }

    #[test]
    fn any_ascii_whitespace_separates_attributes() {
        let (map, _) = parse("\ta=1\nb=2\r\x0Bc=3\x0C", MapSyntax::Attributes);
        assert_eq!(
            map.unwrap(),
            vec![entry("a", Some("1")), entry("b", Some("2")), entry("c", Some("3"))]
        );
    }

    #[test]
    fn unterminated_quote_invalidates_everything() {
        let (map, _) = parse(r#" a=1 title="oops"#, MapSyntax::Attributes);
        assert_eq!(map, Err(Unterminated));
        let (map, _) = parse("color: red; content: 'x", MapSyntax::Declarations);
        assert_eq!(map, Err(Unterminated));
    }

    #[test]
    fn bad_and_empty_keys_are_reported() {
        let (map, bad) = parse(r#" on%click=x =y "q"=z ok"#, MapSyntax::Attributes);
        assert_eq!(map.unwrap(), vec![entry("ok", None)]);
        assert_eq!(bad, vec!["on%click", "", "\"q\""]);
    }

    #[test]
    fn duplicate_key_keeps_first_position_and_last_value() {
        let (map, _) = parse(r#" id="a" class=c id="b""#, MapSyntax::Attributes);
        assert_eq!(
            map.unwrap(),
            vec![entry("id", Some("\"b\"")), entry("class", Some("c"))]
        );
    }

    #[test]
    fn keys_are_lowercased_before_deduplication() {
        let (map, _) = parse(" ID=a Title=t id=b", MapSyntax::Attributes);
        assert_eq!(
            map.unwrap(),
            vec![entry("id", Some("b")), entry("title", Some("t"))]
        );
    }

    #[test]
    fn splits_declarations() {
        let (map, bad) = parse(
            "color: red ; background: url(\"a;b\");; width :; font",
            MapSyntax::Declarations,
        );
        assert_eq!(
            map.unwrap(),
            vec![
                entry("color", Some("red")),
                entry("background", Some("url(\"a;b\")")),
                entry("width", Some("")),
                entry("font", None),
            ]
        );
        assert!(bad.is_empty());
    }

    #[test]
    fn values_keep_non_ascii_text() {
        let (map, _) = parse(" title=\"héllo wörld\"", MapSyntax::Attributes);
        assert_eq!(map.unwrap(), vec![entry("title", Some("\"héllo wörld\""))]);
    }
}
