//! # Truncation and Padding

use crate::encoding::{Direction, Encoding};
use crate::errors::{Result, TokenizerError};
use crate::types::{TokenType, try_token_from_u64};
use serde::{Deserialize, Serialize};

/// How to split the length budget across an input pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationStrategy {
    /// Shorten the longer input first.
    #[default]
    LongestFirst,

    /// Only shorten the first input.
    OnlyFirst,

    /// Only shorten the pair input.
    OnlySecond,
}

/// `truncation` section of `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationParams {
    /// Maximum length, special tokens included.
    pub max_length: usize,

    /// Pair strategy.
    #[serde(default)]
    pub strategy: TruncationStrategy,

    /// Overlap between overflowing windows.
    #[serde(default)]
    pub stride: usize,

    /// Which end is cut.
    #[serde(default)]
    pub direction: Direction,
}

impl TruncationParams {
    /// Truncate to `max_length` with defaults for everything else.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            strategy: TruncationStrategy::default(),
            stride: 0,
            direction: Direction::default(),
        }
    }

    /// Cut the inputs so that, with `added` special tokens, they fit.
    pub fn apply<T: TokenType>(
        &self,
        mut encoding: Encoding<T>,
        mut pair: Option<Encoding<T>>,
        added: usize,
    ) -> Result<(Encoding<T>, Option<Encoding<T>>)> {
        let budget = self.max_length.saturating_sub(added);
        let total = encoding.len() + pair.as_ref().map_or(0, Encoding::len);
        if total <= budget {
            return Ok((encoding, pair));
        }
        let excess = total - budget;

        match (self.strategy, pair.as_mut()) {
            (TruncationStrategy::OnlySecond, None) => {
                return Err(TokenizerError::config(
                    "truncation.strategy",
                    "OnlySecond needs an input pair",
                ));
            }
            (TruncationStrategy::LongestFirst | TruncationStrategy::OnlyFirst, None) => {
                encoding.truncate(budget, self.stride, self.direction)?;
            }
            (TruncationStrategy::LongestFirst, Some(pair)) => {
                let (mut n1, mut n2) = (encoding.len(), pair.len());
                let swap = n1 > n2;
                if swap {
                    std::mem::swap(&mut n1, &mut n2);
                }
                n2 = if n1 > budget {
                    n1
                } else {
                    n2.min(budget - n1).max(n1)
                };
                if n1 + n2 > budget {
                    n1 = budget / 2;
                    n2 = n1 + budget % 2;
                }
                if swap {
                    std::mem::swap(&mut n1, &mut n2);
                }
                encoding.truncate(n1, self.stride, self.direction)?;
                pair.truncate(n2, self.stride, self.direction)?;
            }
            (TruncationStrategy::OnlyFirst, Some(_)) => {
                if encoding.len() <= excess {
                    return Err(TokenizerError::config(
                        "truncation.max_length",
                        "first input is too short to truncate",
                    ));
                }
                let keep = encoding.len() - excess;
                encoding.truncate(keep, self.stride, self.direction)?;
            }
            (TruncationStrategy::OnlySecond, Some(pair)) => {
                if pair.len() <= excess {
                    return Err(TokenizerError::config(
                        "truncation.max_length",
                        "pair input is too short to truncate",
                    ));
                }
                let keep = pair.len() - excess;
                pair.truncate(keep, self.stride, self.direction)?;
            }
        }
        Ok((encoding, pair))
    }
}

/// Target length for padding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddingStrategy {
    /// The longest encoding in the batch.
    #[default]
    BatchLongest,

    /// A fixed length.
    Fixed(usize),
}

fn default_pad_token() -> String {
    "[PAD]".to_string()
}

/// `padding` section of `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingParams {
    /// Target length.
    #[serde(default)]
    pub strategy: PaddingStrategy,

    /// Which end is padded.
    #[serde(default)]
    pub direction: Direction,

    /// Round the target up to a multiple of this.
    #[serde(default)]
    pub pad_to_multiple_of: Option<usize>,

    /// Padding id.
    #[serde(default)]
    pub pad_id: u64,

    /// Padding type id.
    #[serde(default)]
    pub pad_type_id: u32,

    /// Padding token string.
    #[serde(default = "default_pad_token")]
    pub pad_token: String,
}

impl Default for PaddingParams {
    fn default() -> Self {
        Self {
            strategy: PaddingStrategy::default(),
            direction: Direction::default(),
            pad_to_multiple_of: None,
            pad_id: 0,
            pad_type_id: 0,
            pad_token: default_pad_token(),
        }
    }
}

impl PaddingParams {
    /// Pad every encoding in place to the common target length.
    pub fn apply<T: TokenType>(
        &self,
        encodings: &mut [Encoding<T>],
    ) -> Result<()> {
        let pad_id: T = try_token_from_u64(self.pad_id)?;
        let mut target = match self.strategy {
            PaddingStrategy::BatchLongest => encodings.iter().map(Encoding::len).max().unwrap_or(0),
            PaddingStrategy::Fixed(n) => n,
        };
        if let Some(multiple) = self.pad_to_multiple_of
            && multiple > 0
        {
            target = target.div_ceil(multiple) * multiple;
        }
        for encoding in encodings {
            encoding.pad(target, pad_id, self.pad_type_id, &self.pad_token, self.direction);
        }
        Ok(())
    }
}
