//! Escape-aware scanning helpers.
//!
//! A backslash followed by any character is a literal pair and is consumed
//! as a unit; a lone trailing backslash is an ordinary character.

/// Characters escaped when rendering.
const SPECIAL: &[char] = &['\\', '|', ':', ',', '>'];

/// Byte offset of the first unescaped `sep` in `s`.
pub(crate) fn find_unescaped(s: &str, sep: char) -> Option<usize> {
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if c == sep {
            return Some(i);
        }
    }
    None
}

/// Split `s` on every unescaped `sep`.
pub(crate) fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(pos) = find_unescaped(rest, sep) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// Drop the backslash from every escaped pair.
pub(crate) fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape every separator character in `s`.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
