//! # Merge Rank Table ``{ (T, T) -> (Rank, T) }``

use crate::errors::{Result, TokenizerError};
use crate::types::{Pair, PairRankMap, Rank, TokenType};
use crate::vocab::TokenVocab;

/// BPE merge table: each adjacent id pair maps to its priority and result.
///
/// Ranks are merge-list positions, so they form a strict total order.
#[derive(Default, Debug, Clone)]
pub struct MergeRanks<T: TokenType> {
    pairs: PairRankMap<T>,
}

impl<T: TokenType> MergeRanks<T> {
    /// Resolve an ordered merge list against a vocabulary.
    ///
    /// The merged token is `left + right`, with `continuing_subword_prefix`
    /// removed from the front of `right`.
    ///
    /// # Errors
    /// If either side, or the merged token, is missing from the vocabulary.
    pub fn from_merges<S: AsRef<str>>(
        merges: &[(S, S)],
        vocab: &TokenVocab<T>,
        continuing_subword_prefix: Option<&str>,
    ) -> Result<Self> {
        let lookup = |token: &str| {
            vocab.token_to_id(token).ok_or_else(|| {
                TokenizerError::config(
                    "model.merges",
                    format!("token {token:?} is not in the vocabulary"),
                )
            })
        };

        let mut table = Self::default();
        table.pairs.reserve(merges.len());

        for (rank, (left, right)) in merges.iter().enumerate() {
            let (left, right) = (left.as_ref(), right.as_ref());
            let left_id = lookup(left)?;
            let right_id = lookup(right)?;

            let tail = continuing_subword_prefix
                .and_then(|p| right.strip_prefix(p))
                .unwrap_or(right);
            let merged_id = lookup(&format!("{left}{tail}"))?;

            // Earlier entries win on duplicates.
            table
                .pairs
                .entry((left_id, right_id))
                .or_insert((rank as Rank, merged_id));
        }

        Ok(table)
    }

    /// Add a merge.
    pub fn add_merge(
        &mut self,
        pair: Pair<T>,
        rank: Rank,
        merged: T,
    ) {
        self.pairs.insert(pair, (rank, merged));
    }

    /// Look up the rank and result for a pair.
    pub fn get(
        &self,
        pair: &Pair<T>,
    ) -> Option<(Rank, T)> {
        self.pairs.get(pair).copied()
    }

    /// The number of merges.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no merges.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
