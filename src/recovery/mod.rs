//! Text-search recovery of annotations
//!
//! Given only annotation texts, find each one in the document and hand the
//! located span to an insert callback (normally [`AnnotationIndex::add`]).
//! Matching is case-insensitive, tolerant of whitespace differences, and
//! never crosses text that is already annotated.
//!
//! [`AnnotationIndex::add`]: crate::index::AnnotationIndex::add

mod matcher;
mod scanner;
mod trie;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::AnchorConfig;
use crate::document::DocumentAdapter;
use crate::error::Result;
use crate::path::NodePath;
use crate::text::{char_len, char_slice, match_key};
use matcher::longest_match;
use scanner::{scan, TokenKind, TokenStream};
use trie::TargetTrie;

/// A located occurrence of a recovery target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredSpan {
    /// Literal document text of the span
    pub text: String,
    pub leaf_paths: Vec<NodePath>,
    /// Char offset into the first leaf
    pub start_offset: usize,
    /// Exclusive char offset into the last leaf
    pub end_offset: usize,
}

/// Find every target in `doc`, calling `insert` once per match in document
/// order.
///
/// Returns `None` when every target was found, otherwise the original
/// spellings of the missing ones. Targets that are blank after
/// normalization are always missing.
pub fn recover<D, I, S, F>(
    doc: &mut D,
    targets: I,
    config: &AnchorConfig,
    mut insert: F,
) -> Result<Option<BTreeSet<String>>>
where
    D: DocumentAdapter,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&mut D, RecoveredSpan) -> Result<()>,
{
    let mut trie = TargetTrie::new();
    let mut missing = BTreeSet::new();
    for target in targets {
        let original = target.as_ref();
        let key = match_key(original, config.fold_diacritics);
        if key.is_empty() {
            missing.insert(original.to_string());
        } else {
            trie.insert(&key, original.to_string());
        }
    }

    let mut stream = scan(&*doc, config);
    let mut cursor = 0;
    let mut found = 0;

    while !trie.is_empty() && cursor < stream.tokens.len() {
        let Some(hit) = longest_match(&trie, &stream.tokens, cursor) else {
            cursor += 1;
            continue;
        };
        let Some(span) = locate(&*doc, &stream, cursor, hit.last) else {
            cursor += 1;
            continue;
        };
        let Some(word) = trie.take_word(hit.node) else {
            cursor += 1;
            continue;
        };

        let resume = stream.tokens[hit.last].global + 1;
        tracing::debug!(word = %word, text = %span.text, "Recovered annotation span");
        insert(&mut *doc, span)?;
        found += 1;

        stream = scan(&*doc, config);
        cursor = stream.position_from(resume);
    }

    missing.extend(trie.remaining());
    tracing::info!(found = found, missing = missing.len(), "Recovery finished");
    if missing.is_empty() {
        return Ok(None);
    }
    tracing::warn!(missing = ?missing, "Recovery targets not found");
    Ok(Some(missing))
}

/// Build the span covered by tokens `first..=last`
fn locate<D: DocumentAdapter>(
    doc: &D,
    stream: &TokenStream<D::Node>,
    first: usize,
    last: usize,
) -> Option<RecoveredSpan> {
    let (
        TokenKind::Char {
            leaf: first_leaf,
            offset: start_offset,
            ..
        },
        TokenKind::Char {
            leaf: last_leaf,
            offset: last_offset,
            ..
        },
    ) = (stream.tokens.get(first)?.kind, stream.tokens.get(last)?.kind)
    else {
        return None;
    };
    let end_offset = last_offset + 1;

    let leaves = stream.leaves.get(first_leaf..=last_leaf)?;
    let mut fragments = Vec::with_capacity(leaves.len());
    for (i, &leaf) in leaves.iter().enumerate() {
        let text = doc.text(leaf)?;
        let start = if i == 0 { start_offset } else { 0 };
        let end = if i == leaves.len() - 1 {
            end_offset
        } else {
            char_len(text)
        };
        fragments.push(char_slice(text, start, end));
    }

    Some(RecoveredSpan {
        text: fragments.concat(),
        leaf_paths: leaves.iter().map(|&leaf| doc.path_of(leaf)).collect(),
        start_offset,
        end_offset,
    })
}
