//! Canonical token stream over the document text
//!
//! Every non-whitespace char becomes one folded `Char` token. A whitespace
//! run, or a leaf boundary under [`LeafBoundary::Space`], becomes a single
//! `Space` between two chars. A leaf that already sits in an annotation
//! wrapper becomes one `Barrier` that no match may cross.

use crate::config::{AnchorConfig, LeafBoundary};
use crate::document::DocumentAdapter;
use crate::text::fold_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Char {
        folded: char,
        /// Index into [`TokenStream::leaves`]
        leaf: usize,
        /// Char offset within the leaf
        offset: usize,
    },
    Space,
    Barrier,
}

/// A token and the document-global char offset where it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub global: usize,
}

impl Token {
    /// Trie label of this token; barriers have none
    pub fn key(&self) -> Option<char> {
        match self.kind {
            TokenKind::Char { folded, .. } => Some(folded),
            TokenKind::Space => Some(' '),
            TokenKind::Barrier => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct TokenStream<N> {
    pub tokens: Vec<Token>,
    pub leaves: Vec<N>,
}

impl<N> TokenStream<N> {
    /// First token starting at or after `global`
    pub fn position_from(&self, global: usize) -> usize {
        self.tokens.partition_point(|t| t.global < global)
    }
}

pub(crate) fn scan<D: DocumentAdapter>(doc: &D, config: &AnchorConfig) -> TokenStream<D::Node> {
    let leaves = doc.all_leaves_under(doc.root());
    let mut tokens = Vec::new();
    let mut global = 0;
    // Start of a whitespace run not yet emitted as a space
    let mut pending_space: Option<usize> = None;

    for (index, &leaf) in leaves.iter().enumerate() {
        let text = doc.text(leaf).unwrap_or_default();

        if doc.enclosing_wrapper(leaf).is_some() {
            tokens.push(Token {
                kind: TokenKind::Barrier,
                global,
            });
            pending_space = None;
            global += text.chars().count();
            continue;
        }

        if index > 0 && config.leaf_boundary == LeafBoundary::Space {
            pending_space.get_or_insert(global);
        }

        for (offset, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                pending_space.get_or_insert(global);
            } else {
                if let Some(start) = pending_space.take() {
                    if matches!(tokens.last(), Some(Token { kind: TokenKind::Char { .. }, .. })) {
                        tokens.push(Token {
                            kind: TokenKind::Space,
                            global: start,
                        });
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Char {
                        folded: fold_char(c, config.fold_diacritics),
                        leaf: index,
                        offset,
                    },
                    global,
                });
            }
            global += 1;
        }
    }

    TokenStream { tokens, leaves }
}
