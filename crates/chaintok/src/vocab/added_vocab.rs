//! # Added Tokens Vocabulary
//!
//! Literal tokens that bypass the subword model. They are matched with two
//! tries: tokens flagged `normalized = false` against the raw input, the
//! rest against each normalized span using their normalized form.

use crate::errors::Result;
use crate::normalizers::Normalizer;
use crate::trie::Trie;
use crate::types::{StringToTokenMap, TokenToStringMap, TokenType};
use crate::util::unicode::is_word_char;
use ahash::{AHashMap, AHashSet};
use core::ops::Range;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A literal token matched before the subword model runs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddedToken {
    /// The literal text.
    pub content: String,

    /// Only match when not bordered by word characters.
    #[serde(default)]
    pub single_word: bool,

    /// Swallow whitespace on the left.
    #[serde(default)]
    pub lstrip: bool,

    /// Swallow whitespace on the right.
    #[serde(default)]
    pub rstrip: bool,

    /// Match against normalized text, rather than raw input.
    #[serde(default = "default_true")]
    pub normalized: bool,

    /// Special tokens may be skipped when decoding.
    #[serde(default)]
    pub special: bool,
}

impl AddedToken {
    /// Create a new token; special tokens default to matching raw input.
    pub fn new<S: Into<String>>(
        content: S,
        special: bool,
    ) -> Self {
        Self {
            content: content.into(),
            single_word: false,
            lstrip: false,
            rstrip: false,
            normalized: !special,
            special,
        }
    }

    /// Set `single_word`.
    pub fn with_single_word(
        self,
        single_word: bool,
    ) -> Self {
        Self {
            single_word,
            ..self
        }
    }

    /// Set `lstrip`.
    pub fn with_lstrip(
        self,
        lstrip: bool,
    ) -> Self {
        Self { lstrip, ..self }
    }

    /// Set `rstrip`.
    pub fn with_rstrip(
        self,
        rstrip: bool,
    ) -> Self {
        Self { rstrip, ..self }
    }

    /// Set `normalized`.
    pub fn with_normalized(
        self,
        normalized: bool,
    ) -> Self {
        Self { normalized, ..self }
    }
}

/// A piece of text split around added tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment<'a, T: TokenType> {
    /// Ordinary text for the normal pipeline.
    Text {
        /// The text slice.
        text: &'a str,

        /// Byte offset of the slice in the scanned string.
        offset: usize,
    },

    /// A matched added token; any stripped whitespace is dropped.
    Added {
        /// The token's literal content.
        content: &'a str,

        /// The token id.
        id: T,

        /// Is the token special?
        special: bool,
    },
}

impl<'a, T: TokenType> Segment<'a, T> {
    /// The text of the segment.
    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Text { text, .. } => text,
            Segment::Added { content, .. } => content,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct TokenMatcher {
    trie: Trie,
    index: AHashMap<String, usize>,
}

impl TokenMatcher {
    fn add(
        &mut self,
        key: String,
        entry: usize,
    ) -> Result<()> {
        if key.is_empty() || self.index.contains_key(&key) {
            return Ok(());
        }
        self.trie.insert(&key)?;
        self.index.insert(key, entry);
        Ok(())
    }
}

/// The set of added tokens, with their ids and matchers.
#[derive(Clone, Debug, Default)]
pub struct AddedVocabulary<T: TokenType> {
    entries: Vec<(AddedToken, T)>,
    token_to_id: StringToTokenMap<T>,
    id_to_token: TokenToStringMap<T>,
    special_ids: AHashSet<T>,

    raw: TokenMatcher,
    normalized: TokenMatcher,
}

impl<T: TokenType> AddedVocabulary<T> {
    /// Build the vocabulary and its matchers.
    ///
    /// `normalizer` rewrites the content of `normalized` tokens before they
    /// enter the normalized-text matcher.
    pub fn new(
        entries: Vec<(AddedToken, T)>,
        normalizer: Option<&Normalizer>,
    ) -> Result<Self> {
        let mut vocab = Self::default();

        for (idx, (token, id)) in entries.iter().enumerate() {
            vocab.token_to_id.insert(token.content.clone(), *id);
            vocab.id_to_token.insert(*id, token.content.clone());
            if token.special {
                vocab.special_ids.insert(*id);
            }

            if token.normalized {
                let key = match normalizer {
                    Some(n) => n.normalize(&token.content)?,
                    None => token.content.clone(),
                };
                vocab.normalized.add(key, idx)?;
            } else {
                vocab.raw.add(token.content.clone(), idx)?;
            }
        }
        vocab.entries = entries;

        log::debug!(
            "added vocabulary: {} tokens ({} raw, {} normalized, {} special)",
            vocab.entries.len(),
            vocab.raw.index.len(),
            vocab.normalized.index.len(),
            vocab.special_ids.len()
        );
        Ok(vocab)
    }

    /// The number of added tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no added tokens.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the tokens and their ids.
    pub fn tokens(&self) -> impl Iterator<Item = &(AddedToken, T)> {
        self.entries.iter()
    }

    /// Look up the id of an added token.
    pub fn token_to_id(
        &self,
        content: &str,
    ) -> Option<T> {
        self.token_to_id.get(content).copied()
    }

    /// Look up the content of an added token id.
    pub fn id_to_token(
        &self,
        id: T,
    ) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    /// Is this id a special token?
    pub fn is_special(
        &self,
        id: T,
    ) -> bool {
        self.special_ids.contains(&id)
    }

    /// Split raw input around `normalized = false` tokens.
    pub fn split_raw<'a>(
        &'a self,
        text: &'a str,
    ) -> Vec<Segment<'a, T>> {
        self.split_with(&self.raw, text)
    }

    /// Split normalized text around `normalized = true` tokens.
    pub fn split_normalized<'a>(
        &'a self,
        text: &'a str,
    ) -> Vec<Segment<'a, T>> {
        self.split_with(&self.normalized, text)
    }

    fn split_with<'a>(
        &'a self,
        matcher: &TokenMatcher,
        text: &'a str,
    ) -> Vec<Segment<'a, T>> {
        let mut segments = Vec::new();
        let mut last = 0;

        for (range, idx) in self.find_matches(matcher, text) {
            if range.start > last {
                segments.push(Segment::Text {
                    text: &text[last..range.start],
                    offset: last,
                });
            }
            let (token, id) = &self.entries[idx];
            segments.push(Segment::Added {
                content: &token.content,
                id: *id,
                special: token.special,
            });
            last = range.end;
        }

        if last < text.len() {
            segments.push(Segment::Text {
                text: &text[last..],
                offset: last,
            });
        }
        segments
    }

    /// Leftmost-longest matches, widened by `lstrip` / `rstrip`.
    fn find_matches(
        &self,
        matcher: &TokenMatcher,
        text: &str,
    ) -> Vec<(Range<usize>, usize)> {
        let mut matches = Vec::new();
        if matcher.trie.is_empty() {
            return matches;
        }

        let mut prev_end = 0;
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let Some((found, idx)) = matcher
                .trie
                .longest_prefix(rest)
                .and_then(|found| Some((found, *matcher.index.get(found)?)))
            else {
                pos += rest.chars().next().map_or(1, char::len_utf8);
                continue;
            };

            let token = &self.entries[idx].0;
            let mut start = pos;
            let mut end = pos + found.len();

            if token.single_word {
                let left_ok = !text[..start].chars().next_back().is_some_and(is_word_char);
                let right_ok = !text[end..].chars().next().is_some_and(is_word_char);
                if !(left_ok && right_ok) {
                    pos = end;
                    continue;
                }
            }

            if token.lstrip {
                start -= text[prev_end..start]
                    .chars()
                    .rev()
                    .take_while(|c| c.is_whitespace())
                    .map(char::len_utf8)
                    .sum::<usize>();
            }
            if token.rstrip {
                end += text[end..]
                    .chars()
                    .take_while(|c| c.is_whitespace())
                    .map(char::len_utf8)
                    .sum::<usize>();
            }

            matches.push((start..end, idx));
            prev_end = end;
            pos = end;
        }
        matches
    }
}
