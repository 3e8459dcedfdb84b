//! Character trie of pending recovery targets
//!
//! Keys are folded target texts; each terminal node keeps the original
//! spellings that normalize to it, so duplicates need one match apiece.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct TrieNode {
    edges: BTreeMap<char, usize>,
    words: Vec<String>,
    parent: Option<(usize, char)>,
}

/// Arena trie keyed by folded chars
#[derive(Debug)]
pub(crate) struct TargetTrie {
    nodes: Vec<TrieNode>,
}

impl TargetTrie {
    pub const ROOT: usize = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    pub fn insert(&mut self, key: &[char], original: String) {
        let mut node = Self::ROOT;
        for &c in key {
            node = match self.nodes[node].edges.get(&c) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode {
                        parent: Some((node, c)),
                        ..TrieNode::default()
                    });
                    self.nodes[node].edges.insert(c, next);
                    next
                }
            };
        }
        self.nodes[node].words.push(original);
    }

    /// Follow the edge labelled `c`
    pub fn step(&self, node: usize, c: char) -> Option<usize> {
        self.nodes.get(node)?.edges.get(&c).copied()
    }

    /// Whether a target ends at `node`
    pub fn is_terminal(&self, node: usize) -> bool {
        self.nodes.get(node).is_some_and(|n| !n.words.is_empty())
    }

    /// Take one original spelling ending at `node`, pruning branches left
    /// without targets
    pub fn take_word(&mut self, node: usize) -> Option<String> {
        let slot = self.nodes.get_mut(node)?;
        if slot.words.is_empty() {
            return None;
        }
        let word = slot.words.remove(0);

        let mut current = node;
        while current != Self::ROOT
            && self.nodes[current].words.is_empty()
            && self.nodes[current].edges.is_empty()
        {
            let Some((parent, c)) = self.nodes[current].parent.take() else {
                break;
            };
            self.nodes[parent].edges.remove(&c);
            current = parent;
        }
        Some(word)
    }

    /// No targets left
    pub fn is_empty(&self) -> bool {
        self.nodes[Self::ROOT].edges.is_empty() && self.nodes[Self::ROOT].words.is_empty()
    }

    /// Original spellings of every target still in the trie
    pub fn remaining(&self) -> Vec<String> {
        let mut words = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(node) = stack.pop() {
            words.extend(self.nodes[node].words.iter().cloned());
            stack.extend(self.nodes[node].edges.values().copied());
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn walk(trie: &TargetTrie, s: &str) -> Option<usize> {
        s.chars()
            .try_fold(TargetTrie::ROOT, |node, c| trie.step(node, c))
    }

    #[test]
    fn test_insert_and_step() {
        let mut trie = TargetTrie::new();
        trie.insert(&key("new"), "New".to_string());
        trie.insert(&key("new york"), "new york".to_string());

        let new = walk(&trie, "new").unwrap();
        assert!(trie.is_terminal(new));
        assert!(!trie.is_terminal(walk(&trie, "new ").unwrap()));
        assert!(walk(&trie, "newt").is_none());
    }

    #[test]
    fn test_take_word_prunes() {
        let mut trie = TargetTrie::new();
        trie.insert(&key("ab"), "ab".to_string());
        trie.insert(&key("abcd"), "ABCD".to_string());

        let abcd = walk(&trie, "abcd").unwrap();
        assert_eq!(trie.take_word(abcd).as_deref(), Some("ABCD"));
        assert!(walk(&trie, "abc").is_none());
        assert!(walk(&trie, "ab").is_some());

        let ab = walk(&trie, "ab").unwrap();
        assert_eq!(trie.take_word(ab).as_deref(), Some("ab"));
        assert_eq!(trie.take_word(ab), None);
        assert!(trie.is_empty());
    }

    #[test]
    fn test_duplicates_need_separate_takes() {
        let mut trie = TargetTrie::new();
        trie.insert(&key("the"), "the".to_string());
        trie.insert(&key("the"), "The".to_string());

        let node = walk(&trie, "the").unwrap();
        assert_eq!(trie.take_word(node).as_deref(), Some("the"));
        assert!(!trie.is_empty());
        assert_eq!(trie.remaining(), vec!["The".to_string()]);
    }
}
