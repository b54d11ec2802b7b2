//! # Encodings
//!
//! The request-scoped result of encoding one input (or one input pair).

use crate::errors::{Result, TokenizerError};
use crate::models::Token;
use crate::types::TokenType;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Which end of a sequence truncation or padding applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The start of the sequence.
    Left,

    /// The end of the sequence.
    #[default]
    Right,
}

/// Token ids with their strings and masks.
///
/// All per-token vectors have the same length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoding<T: TokenType> {
    ids: Vec<T>,
    tokens: Vec<String>,
    type_ids: Vec<u32>,
    attention_mask: Vec<u32>,
    special_tokens_mask: Vec<u32>,
    overflowing: Vec<Encoding<T>>,
}

impl<T: TokenType> Encoding<T> {
    /// Create an empty encoding with room for `capacity` tokens.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            tokens: Vec::with_capacity(capacity),
            type_ids: Vec::with_capacity(capacity),
            attention_mask: Vec::with_capacity(capacity),
            special_tokens_mask: Vec::with_capacity(capacity),
            overflowing: Vec::new(),
        }
    }

    /// Build an encoding from model tokens, all with the same type id.
    pub fn from_tokens(
        tokens: Vec<Token<T>>,
        type_id: u32,
    ) -> Self {
        let mut encoding = Self::with_capacity(tokens.len());
        for token in tokens {
            encoding.push(token.id, token.value, type_id, false);
        }
        encoding
    }

    /// Append one token.
    pub fn push<S: Into<String>>(
        &mut self,
        id: T,
        token: S,
        type_id: u32,
        special: bool,
    ) {
        self.ids.push(id);
        self.tokens.push(token.into());
        self.type_ids.push(type_id);
        self.attention_mask.push(1);
        self.special_tokens_mask.push(special as u32);
    }

    /// Append every token of `other`; its overflowing parts are kept too.
    pub fn extend(
        &mut self,
        other: Encoding<T>,
    ) {
        self.ids.extend(other.ids);
        self.tokens.extend(other.tokens);
        self.type_ids.extend(other.type_ids);
        self.attention_mask.extend(other.attention_mask);
        self.special_tokens_mask.extend(other.special_tokens_mask);
        self.overflowing.extend(other.overflowing);
    }

    /// Concatenate a list of encodings.
    pub fn merge<I: IntoIterator<Item = Encoding<T>>>(encodings: I) -> Self {
        let mut merged = Self::default();
        for encoding in encodings {
            merged.extend(encoding);
        }
        merged
    }

    /// The number of tokens.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Token ids.
    pub fn ids(&self) -> &[T] {
        &self.ids
    }

    /// Token strings.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [String] {
        &mut self.tokens
    }

    /// Sequence type ids; `0` for the first input, `1` for the pair.
    pub fn type_ids(&self) -> &[u32] {
        &self.type_ids
    }

    /// `1` for real tokens, `0` for padding.
    pub fn attention_mask(&self) -> &[u32] {
        &self.attention_mask
    }

    /// `1` for special and padding tokens.
    pub fn special_tokens_mask(&self) -> &[u32] {
        &self.special_tokens_mask
    }

    /// Parts cut off by truncation.
    pub fn overflowing(&self) -> &[Encoding<T>] {
        &self.overflowing
    }

    /// Consume the encoding, keeping only the ids.
    pub fn into_ids(self) -> Vec<T> {
        self.ids
    }

    /// Overwrite every type id.
    pub fn set_type_ids(
        &mut self,
        type_id: u32,
    ) {
        self.type_ids.iter_mut().for_each(|t| *t = type_id);
    }

    fn slice(
        &self,
        range: Range<usize>,
    ) -> Self {
        Self {
            ids: self.ids[range.clone()].to_vec(),
            tokens: self.tokens[range.clone()].to_vec(),
            type_ids: self.type_ids[range.clone()].to_vec(),
            attention_mask: self.attention_mask[range.clone()].to_vec(),
            special_tokens_mask: self.special_tokens_mask[range].to_vec(),
            overflowing: Vec::new(),
        }
    }

    /// Cut the encoding down to `max_len` tokens.
    ///
    /// The removed tokens are kept as overflowing windows of at most
    /// `max_len` tokens, each repeating the last `stride` tokens of the
    /// window before it.
    pub fn truncate(
        &mut self,
        max_len: usize,
        stride: usize,
        direction: Direction,
    ) -> Result<()> {
        let total = self.len();
        if total <= max_len {
            return Ok(());
        }
        if max_len == 0 {
            let all = std::mem::take(self);
            self.overflowing.push(all);
            return Ok(());
        }
        if stride >= max_len {
            return Err(TokenizerError::config(
                "truncation.stride",
                format!("stride {stride} must be smaller than max_length {max_len}"),
            ));
        }

        let step = max_len - stride;
        let mut windows = Vec::new();
        match direction {
            Direction::Right => {
                let mut start = 0;
                loop {
                    let end = (start + max_len).min(total);
                    windows.push(start..end);
                    if end == total {
                        break;
                    }
                    start += step;
                }
            }
            Direction::Left => {
                let mut end = total;
                loop {
                    let start = end.saturating_sub(max_len);
                    windows.push(start..end);
                    if start == 0 {
                        break;
                    }
                    end -= step;
                }
            }
        }

        let mut parts = windows.into_iter().map(|r| self.slice(r));
        let kept = parts.next().unwrap_or_default();
        let overflowing = parts.collect();
        *self = kept;
        self.overflowing = overflowing;
        Ok(())
    }

    /// Pad the encoding (and its overflowing parts) up to `target_len`.
    pub fn pad(
        &mut self,
        target_len: usize,
        pad_id: T,
        pad_type_id: u32,
        pad_token: &str,
        direction: Direction,
    ) {
        for part in &mut self.overflowing {
            part.pad(target_len, pad_id, pad_type_id, pad_token, direction);
        }

        let count = target_len.saturating_sub(self.len());
        if count == 0 {
            return;
        }
        match direction {
            Direction::Right => {
                self.ids.extend(std::iter::repeat_n(pad_id, count));
                self.tokens
                    .extend(std::iter::repeat_n(pad_token.to_string(), count));
                self.type_ids.extend(std::iter::repeat_n(pad_type_id, count));
                self.attention_mask.extend(std::iter::repeat_n(0, count));
                self.special_tokens_mask
                    .extend(std::iter::repeat_n(1, count));
            }
            Direction::Left => {
                prepend(&mut self.ids, pad_id, count);
                prepend(&mut self.tokens, pad_token.to_string(), count);
                prepend(&mut self.type_ids, pad_type_id, count);
                prepend(&mut self.attention_mask, 0, count);
                prepend(&mut self.special_tokens_mask, 1, count);
            }
        }
    }
}

fn prepend<V: Clone>(
    values: &mut Vec<V>,
    value: V,
    count: usize,
) {
    values.splice(0..0, std::iter::repeat_n(value, count));
}
