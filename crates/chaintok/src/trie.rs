//! # Prefix Trie
//!
//! An arena-backed prefix tree over `char` units. Used by the added-token
//! matcher and the Unigram lattice builder.

use crate::errors::{Result, TokenizerError};
use ahash::AHashMap;

/// Index of a node in the trie arena.
pub type NodeId = usize;

const ROOT: NodeId = 0;

/// A single trie node.
#[derive(Clone, Debug, Default)]
pub struct TrieNode {
    children: AHashMap<char, NodeId>,
    is_leaf: bool,
}

impl TrieNode {
    /// Does an inserted sequence end at this node?
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Number of child edges.
    pub fn num_children(&self) -> usize {
        self.children.len()
    }
}

/// Arena prefix tree; nodes are addressed by [`NodeId`].
#[derive(Clone, Debug)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    len: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Trie {
    /// Build a trie, skipping empty sequences.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Self::new();
        for s in iter {
            let s = s.as_ref();
            if !s.is_empty() {
                trie.insert_non_empty(s);
            }
        }
        trie
    }
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            len: 0,
        }
    }

    /// Number of distinct sequences inserted.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the trie empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a sequence; idempotent.
    ///
    /// # Errors
    /// The empty sequence cannot be inserted.
    pub fn insert(
        &mut self,
        sequence: &str,
    ) -> Result<()> {
        if sequence.is_empty() {
            return Err(TokenizerError::config(
                "trie",
                "cannot insert an empty sequence",
            ));
        }

        self.insert_non_empty(sequence);
        Ok(())
    }

    /// Insert a sequence the caller has checked is non-empty.
    fn insert_non_empty(
        &mut self,
        sequence: &str,
    ) {
        let mut node = ROOT;
        for c in sequence.chars() {
            node = match self.nodes[node].children.get(&c) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(c, child);
                    child
                }
            };
        }

        let leaf = &mut self.nodes[node];
        if !leaf.is_leaf {
            leaf.is_leaf = true;
            self.len += 1;
        }
    }

    /// Get the node reached by an exact sequence, if any.
    pub fn get(
        &self,
        sequence: &str,
    ) -> Option<&TrieNode> {
        let mut node = ROOT;
        for c in sequence.chars() {
            node = *self.nodes[node].children.get(&c)?;
        }
        Some(&self.nodes[node])
    }

    /// Was this exact sequence inserted?
    pub fn contains(
        &self,
        sequence: &str,
    ) -> bool {
        self.get(sequence).is_some_and(TrieNode::is_leaf)
    }

    /// Every inserted sequence that is a prefix of `text`, shortest first.
    ///
    /// Items are slices of `text`.
    pub fn common_prefix_search<'a>(
        &'a self,
        text: &'a str,
    ) -> CommonPrefixIter<'a> {
        CommonPrefixIter {
            trie: self,
            text,
            chars: text.char_indices(),
            node: Some(ROOT),
        }
    }

    /// The longest inserted sequence that is a prefix of `text`.
    pub fn longest_prefix<'a>(
        &'a self,
        text: &'a str,
    ) -> Option<&'a str> {
        self.common_prefix_search(text).last()
    }
}

/// Lazy iterator returned by [`Trie::common_prefix_search`].
pub struct CommonPrefixIter<'a> {
    trie: &'a Trie,
    text: &'a str,
    chars: core::str::CharIndices<'a>,
    node: Option<NodeId>,
}

impl<'a> Iterator for CommonPrefixIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.node?;
            let Some((idx, c)) = self.chars.next() else {
                self.node = None;
                return None;
            };

            match self.trie.nodes[node].children.get(&c) {
                Some(&child) => {
                    self.node = Some(child);
                    if self.trie.nodes[child].is_leaf {
                        return Some(&self.text[..idx + c.len_utf8()]);
                    }
                }
                None => {
                    self.node = None;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{check_is_send, check_is_sync};

    #[test]
    fn test_common_prefix_search() {
        let trie: Trie = ["cat", "carp", "car"].into_iter().collect();
        assert_eq!(trie.len(), 3);

        let found: Vec<&str> = trie.common_prefix_search("carpooling").collect();
        assert_eq!(found, vec!["car", "carp"]);

        // Repeatable.
        assert_eq!(trie.common_prefix_search("carpooling").count(), 2);

        assert_eq!(trie.longest_prefix("carpooling"), Some("carp"));
        assert_eq!(trie.longest_prefix("dog"), None);
        assert_eq!(trie.common_prefix_search("").count(), 0);
    }

    #[test]
    fn test_insert_idempotent() {
        let mut trie = Trie::new();
        trie.insert("héllo").unwrap();
        trie.insert("héllo").unwrap();
        assert_eq!(trie.len(), 1);

        assert!(trie.contains("héllo"));
        assert!(!trie.contains("hé"));

        let node = trie.get("hé").unwrap();
        assert!(!node.is_leaf());
        assert_eq!(node.num_children(), 1);

        assert!(trie.get("hex").is_none());
    }

    #[test]
    fn test_empty_insert_is_error() {
        let mut trie = Trie::new();
        assert!(trie.insert("").is_err());
        assert!(trie.is_empty());
    }

    #[test]
    fn test_collect_skips_empty() {
        let trie: Trie = ["", "ab", "", "ab", "a"].into_iter().collect();
        assert_eq!(trie.len(), 2);
        assert!(trie.contains("a"));
        assert!(trie.contains("ab"));
        assert!(!trie.contains(""));
    }

    #[test]
    fn test_multibyte_prefix_slices() {
        let trie: Trie = ["<|", "<|im_start|>", "▁▁"].into_iter().collect();
        let found: Vec<&str> = trie.common_prefix_search("<|im_start|>user").collect();
        assert_eq!(found, vec!["<|", "<|im_start|>"]);
        assert_eq!(trie.longest_prefix("▁▁▁"), Some("▁▁"));
    }

    #[test]
    fn test_send_sync() {
        let trie = Trie::new();
        check_is_send(&trie);
        check_is_sync(&trie);
    }
}
