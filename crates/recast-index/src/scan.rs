//! Low-level lexical helpers shared by the sketch parser and the engine.
//!
//! All scanning is byte-oriented over UTF-8 text and skips string literals,
//! char literals, and comments, so positions always point at real code.

use recast_core::TextRange;

pub fn is_ident_start(b: u8) -> bool {
    (b as char).is_ascii_alphabetic() || b == b'_' || b == b'$'
}

pub fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || (b as char).is_ascii_digit()
}

pub fn eq_ignore_ascii_ws(a: &str, b: &str) -> bool {
    let mut ia = a
        .as_bytes()
        .iter()
        .copied()
        .filter(|c| !c.is_ascii_whitespace());
    let mut ib = b
        .as_bytes()
        .iter()
        .copied()
        .filter(|c| !c.is_ascii_whitespace());
    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
    }
}

pub(crate) fn skip_string(bytes: &[u8], mut i: usize) -> usize {
    debug_assert_eq!(bytes.get(i), Some(&b'"'));

    // Java text blocks: """ ... """
    if i + 2 < bytes.len() && bytes[i + 1] == b'"' && bytes[i + 2] == b'"' {
        i += 3;
        while i + 2 < bytes.len() {
            if bytes[i] == b'\\' {
                i = (i + 2).min(bytes.len());
                continue;
            }
            if bytes[i] == b'"' && bytes[i + 1] == b'"' && bytes[i + 2] == b'"' {
                return i + 3;
            }
            i += 1;
        }
        return bytes.len();
    }

    i += 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i = (i + 2).min(bytes.len());
            continue;
        }
        if bytes[i] == b'"' {
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

pub(crate) fn skip_char(bytes: &[u8], mut i: usize) -> usize {
    debug_assert_eq!(bytes.get(i), Some(&b'\''));
    i += 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i = (i + 2).min(bytes.len());
            continue;
        }
        if bytes[i] == b'\'' {
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Given the offset of an `(`, returns the offset just past the matching `)`.
pub fn find_matching_paren(text: &str, open_paren: usize) -> Option<usize> {
    find_matching(text, open_paren, b'(', b')')
}

/// Given the offset of a `{`, returns the offset just past the matching `}`.
pub fn find_matching_brace(text: &str, open_brace: usize) -> Option<usize> {
    find_matching(text, open_brace, b'{', b'}')
}

fn find_matching(text: &str, open_pos: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open_pos;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' {
            i = skip_string(bytes, i);
            continue;
        }
        if b == b'\'' {
            i = skip_char(bytes, i);
            continue;
        }
        if b == b'/' && i + 1 < bytes.len() {
            if bytes[i + 1] == b'/' {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if bytes[i + 1] == b'*' {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                continue;
            }
        }
        if b == open {
            depth += 1;
        } else if b == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i + 1);
            }
        }
        i += 1;
    }
    None
}

/// Split `text` on `sep` at nesting depth zero (parens, brackets, braces, and
/// angle brackets all count), string-aware.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    split_top_level_ranges(text, sep)
        .into_iter()
        .map(|r| text[r.start..r.end].to_string())
        .collect()
}

/// Like [`split_top_level`] but returns the byte range of each piece.
pub fn split_top_level_ranges(text: &str, sep: char) -> Vec<TextRange> {
    let mut out = Vec::new();
    let mut depth_paren = 0i32;
    let mut depth_brack = 0i32;
    let mut depth_brace = 0i32;
    let mut depth_angle = 0i32;
    let mut start = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' {
            i = skip_string(bytes, i);
            continue;
        }
        if b == b'\'' {
            i = skip_char(bytes, i);
            continue;
        }
        match b {
            b'(' => depth_paren += 1,
            b')' => depth_paren -= 1,
            b'[' => depth_brack += 1,
            b']' => depth_brack -= 1,
            b'{' => depth_brace += 1,
            b'}' => depth_brace -= 1,
            b'<' => depth_angle += 1,
            b'>' => depth_angle -= 1,
            _ => {}
        }
        if b as char == sep
            && depth_paren == 0
            && depth_brack == 0
            && depth_brace == 0
            && depth_angle == 0
        {
            out.push(TextRange::new(start, i));
            start = i + 1;
        }
        i += 1;
    }
    out.push(TextRange::new(start, bytes.len()));
    out
}

/// Finds the first whole-word occurrence of `ident` in `text`.
pub fn find_identifier(text: &str, ident: &str) -> Option<usize> {
    if ident.is_empty() {
        return None;
    }
    let bytes = text.as_bytes();
    let needle = ident.as_bytes();
    let mut i = 0usize;
    while i + needle.len() <= bytes.len() {
        if &bytes[i..i + needle.len()] == needle {
            let before_ok = i == 0 || !is_ident_continue(bytes[i - 1]);
            let after_ok =
                i + needle.len() == bytes.len() || !is_ident_continue(bytes[i + needle.len()]);
            if before_ok && after_ok {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// A whole-word identifier hit, with a flag telling whether it was found
/// inside a `/** ... */` comment (doc references) rather than in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentOccurrence {
    pub range: TextRange,
    pub in_doc_comment: bool,
}

/// Finds all whole-word occurrences of `name`, skipping strings, char
/// literals, and plain comments. Occurrences inside `/** ... */` doc comments
/// are reported with `in_doc_comment` set so the caller can treat them as
/// documentation cross-references.
pub fn find_identifier_occurrences(text: &str, name: &str) -> Vec<IdentOccurrence> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            i = skip_string(bytes, i);
            continue;
        }
        if bytes[i] == b'\'' {
            i = skip_char(bytes, i);
            continue;
        }
        if bytes[i] == b'/' && i + 1 < bytes.len() {
            if bytes[i + 1] == b'/' {
                i += 2;
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if bytes[i + 1] == b'*' {
                let is_doc = i + 2 < bytes.len() && bytes[i + 2] == b'*';
                let comment_start = i;
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                let comment_end = (i + 2).min(bytes.len());
                if is_doc {
                    // Scan the comment body for identifier hits; the caller
                    // classifies them further (e.g. `#name(` link targets).
                    collect_whole_words(text, comment_start, comment_end, name, true, &mut out);
                }
                i = comment_end;
                continue;
            }
        }

        if is_ident_start(bytes[i]) {
            let start = i;
            i += 1;
            while i < bytes.len() && is_ident_continue(bytes[i]) {
                i += 1;
            }
            if &text[start..i] == name {
                out.push(IdentOccurrence {
                    range: TextRange::new(start, i),
                    in_doc_comment: false,
                });
            }
            continue;
        }

        i += 1;
    }

    out
}

fn collect_whole_words(
    text: &str,
    start: usize,
    end: usize,
    name: &str,
    in_doc: bool,
    out: &mut Vec<IdentOccurrence>,
) {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < end {
        if is_ident_start(bytes[i]) {
            let word_start = i;
            i += 1;
            while i < end && is_ident_continue(bytes[i]) {
                i += 1;
            }
            if &text[word_start..i] == name {
                out.push(IdentOccurrence {
                    range: TextRange::new(word_start, i),
                    in_doc_comment: in_doc,
                });
            }
            continue;
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_generics_intact() {
        let parts = split_top_level("Map<String, Integer> map, int x", ',');
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].trim(), "Map<String, Integer> map");
        assert_eq!(parts[1].trim(), "int x");
    }

    #[test]
    fn occurrences_skip_strings_and_line_comments() {
        let text = "foo(); // foo\nString s = \"foo\";\nfoo();";
        let hits = find_identifier_occurrences(text, "foo");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| !h.in_doc_comment));
    }

    #[test]
    fn occurrences_report_doc_comment_hits() {
        let text = "/** calls {@link A#foo(int)} */\nvoid bar() { foo(1); }";
        let hits = find_identifier_occurrences(text, "foo");
        assert_eq!(hits.len(), 2);
        assert!(hits[0].in_doc_comment);
        assert!(!hits[1].in_doc_comment);
    }

    #[test]
    fn matching_paren_skips_nested_and_strings() {
        let text = "call(a, \"x)y\", f(b))";
        assert_eq!(find_matching_paren(text, 4), Some(text.len()));
    }
}
