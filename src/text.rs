//! Text normalization shared by span validation and recovery
//!
//! All offsets in this crate count `char`s. Folding maps one char to exactly
//! one char so folded positions line up with document positions.

use unicode_normalization::char::decompose_canonical;

/// Collapse whitespace runs to a single space and trim both ends
pub fn canonicalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compare `expected` with the concatenation of leaf `fragments` after
/// canonicalizing both.
///
/// With `boundary_space` each boundary between two fragments may also read
/// as one space that the document does not contain, so `"New York"` matches
/// the leaves `"New"` and `"York"`.
pub fn matches_fragments(fragments: &[&str], expected: &str, boundary_space: bool) -> bool {
    let expected: Vec<char> = canonicalize(expected).chars().collect();

    // Collapsed concatenation; the flag marks the first char of each later fragment
    let mut found: Vec<(char, bool)> = Vec::new();
    for (i, fragment) in fragments.iter().enumerate() {
        let mut at_boundary = i > 0;
        for c in fragment.chars() {
            if c.is_whitespace() {
                if found.last().is_some_and(|&(last, _)| last != ' ') {
                    found.push((' ', at_boundary));
                }
            } else {
                found.push((c, at_boundary));
            }
            at_boundary = false;
        }
    }
    if found.last().is_some_and(|&(last, _)| last == ' ') {
        found.pop();
    }

    let mut j = 0;
    for (c, at_boundary) in found {
        if at_boundary && boundary_space && c != ' ' && expected.get(j) == Some(&' ') {
            j += 1;
        }
        if expected.get(j) != Some(&c) {
            return false;
        }
        j += 1;
    }
    j == expected.len()
}

/// Fold a character for case-insensitive matching.
///
/// With `strip_diacritics` the character is first reduced to the base of its
/// canonical decomposition (`é` -> `e`).
pub fn fold_char(c: char, strip_diacritics: bool) -> char {
    let base = if strip_diacritics { base_char(c) } else { c };
    base.to_lowercase().next().unwrap_or(base)
}

fn base_char(c: char) -> char {
    let mut base = None;
    decompose_canonical(c, |d| {
        if base.is_none() {
            base = Some(d);
        }
    });
    base.unwrap_or(c)
}

/// Canonical, folded key for a target string: lower-cased, internal
/// whitespace runs collapsed to one space, trimmed
pub fn match_key(text: &str, strip_diacritics: bool) -> Vec<char> {
    canonicalize(text)
        .chars()
        .map(|c| if c == ' ' { ' ' } else { fold_char(c, strip_diacritics) })
        .collect()
}

/// Length of `text` in chars
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `index`-th char, or `text.len()` past the end
fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Slice `text` by char offsets `[start, end)`; offsets past the end clamp
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    &text[from..to]
}

/// Split `text` into the parts before, inside and after `[start, end)`
pub fn split_chars(text: &str, start: usize, end: usize) -> (&str, &str, &str) {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    (&text[..from], &text[from..to], &text[to..])
}
