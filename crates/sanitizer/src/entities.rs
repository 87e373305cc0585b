//! Character reference primitives: recognizing, decoding and encoding.
//!
//! Contract:
//! - Named references decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;` and the
//!   typographic names in `NAMED`.
//! - Numeric references decoded only when well-formed and semicolon-terminated:
//!   `&#123;` (decimal) and `&#x1F4A9;` (hex), and only for valid Unicode scalar values.
//! - Anything else passes through unchanged.
//!
//! Recognition (`reference_end`) is syntactic for names: any `&name;` counts as a reference
//! when escaping, even if `decode_entities` does not know it.

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111
const MAX_NAME_LEN: usize = 32;

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("iexcl", '¡'),
    ("cent", '¢'),
    ("pound", '£'),
    ("yen", '¥'),
    ("sect", '§'),
    ("copy", '©'),
    ("laquo", '«'),
    ("shy", '\u{00AD}'),
    ("reg", '®'),
    ("deg", '°'),
    ("plusmn", '±'),
    ("para", '¶'),
    ("middot", '·'),
    ("raquo", '»'),
    ("iquest", '¿'),
    ("times", '×'),
    ("divide", '÷'),
    ("ensp", '\u{2002}'),
    ("emsp", '\u{2003}'),
    ("thinsp", '\u{2009}'),
    ("ndash", '–'),
    ("mdash", '—'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("bull", '•'),
    ("hellip", '…'),
    ("euro", '€'),
    ("trade", '™'),
    ("larr", '←'),
    ("uarr", '↑'),
    ("rarr", '→'),
    ("darr", '↓'),
    ("harr", '↔'),
    ("hearts", '♥'),
];

/// Index of the `;` closing a run of 1..=`max` digits in `radix`, starting at `start`.
fn digits_end(bytes: &[u8], start: usize, max: usize, radix: u32) -> Option<usize> {
    let run = bytes[start..]
        .iter()
        .take(max + 1)
        .take_while(|b| char::from(**b).is_digit(radix))
        .count();
    if run == 0 || run > max {
        return None;
    }
    (bytes.get(start + run) == Some(&b';')).then_some(start + run)
}

/// Index of the `;` closing an ASCII name `[A-Za-z][A-Za-z0-9]*` starting at `start`.
fn name_end(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes.get(start)?.is_ascii_alphabetic() {
        return None;
    }
    let run = bytes[start..]
        .iter()
        .take(MAX_NAME_LEN + 1)
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    (run <= MAX_NAME_LEN && bytes.get(start + run) == Some(&b';')).then_some(start + run)
}

/// Parses the reference at `s[i] == '&'`: the character it stands for (when this module
/// knows it) and the index one past its `;`.
fn parse_reference(s: &str, i: usize) -> Option<(Option<char>, usize)> {
    let bytes = s.as_bytes();
    let numeric = |start: usize, max: usize, radix: u32| {
        let end = digits_end(bytes, start, max, radix)?;
        let ch = u32::from_str_radix(&s[start..end], radix)
            .ok()
            .and_then(char::from_u32)?;
        Some((Some(ch), end + 1))
    };
    match (bytes.get(i + 1), bytes.get(i + 2)) {
        (Some(b'#'), Some(b'x' | b'X')) => numeric(i + 3, MAX_HEX_DIGITS, 16),
        (Some(b'#'), _) => numeric(i + 2, MAX_DEC_DIGITS, 10),
        _ => {
            let end = name_end(bytes, i + 1)?;
            let name = &s[i + 1..end];
            let ch = NAMED
                .iter()
                .find_map(|(known, ch)| (*known == name).then_some(*ch));
            Some((ch, end + 1))
        }
    }
}

/// Returns the end (exclusive) of a well-formed character reference starting at `i`.
pub(crate) fn reference_end(s: &str, i: usize) -> Option<usize> {
    if s.as_bytes().get(i) != Some(&b'&') {
        return None;
    }
    parse_reference(s, i).map(|(_, end)| end)
}

/// Decodes the character references this module knows; everything else is kept verbatim.
pub(crate) fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = 0;
    let mut from = 0;
    while let Some(rel) = memchr::memchr(b'&', &s.as_bytes()[from..]) {
        let at = from + rel;
        match parse_reference(s, at) {
            Some((Some(ch), end)) => {
                out.push_str(&s[rest..at]);
                out.push(ch);
                rest = end;
                from = end;
            }
            Some((None, end)) => from = end,
            None => from = at + 1,
        }
    }
    out.push_str(&s[rest..]);
    out
}

/// Encodes a value for a double-quoted attribute: `&`, `"`, `<` and `>` are escaped.
pub(crate) fn encode_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
