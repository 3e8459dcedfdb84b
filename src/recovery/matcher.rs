//! Longest-match search of the trie against the token stream

use super::scanner::Token;
use super::trie::TargetTrie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Following trie edges token by token
    Advancing,
    /// Dead end reached; unwinding to the deepest terminal node
    Backtracking,
}

/// A terminal trie node reached from some start token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrieMatch {
    pub node: usize,
    /// Index of the last matched token (inclusive)
    pub last: usize,
}

/// Find the longest target starting at `tokens[start]`
pub(crate) fn longest_match(trie: &TargetTrie, tokens: &[Token], start: usize) -> Option<TrieMatch> {
    let mut trail: Vec<TrieMatch> = Vec::new();
    let mut node = TargetTrie::ROOT;
    let mut cursor = start;
    let mut phase = Phase::Advancing;

    loop {
        match phase {
            Phase::Advancing => {
                let next = tokens
                    .get(cursor)
                    .and_then(Token::key)
                    .and_then(|c| trie.step(node, c));
                match next {
                    Some(next) => {
                        trail.push(TrieMatch {
                            node: next,
                            last: cursor,
                        });
                        node = next;
                        cursor += 1;
                    }
                    None => phase = Phase::Backtracking,
                }
            }
            Phase::Backtracking => match trail.last().copied() {
                Some(step) if trie.is_terminal(step.node) => return Some(step),
                Some(_) => {
                    trail.pop();
                }
                None => return None,
            },
        }
    }
}
