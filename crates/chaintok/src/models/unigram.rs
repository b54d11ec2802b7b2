//! # Unigram Model
//!
//! Viterbi segmentation over piece log-probabilities.

use crate::errors::{Result, TokenizerError};
use crate::models::Token;
use crate::models::bpe::byte_fallback_token;
use crate::trie::Trie;
use crate::types::{TokenType, try_token_from_usize};
use crate::vocab::TokenVocab;

/// Score penalty below the worst piece for unknown chars.
pub const UNK_PENALTY: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default)]
struct BestPath {
    id: usize,
    score: f64,
    starts_at: Option<usize>,
}

/// SentencePiece unigram model.
#[derive(Clone, Debug)]
pub struct Unigram<T: TokenType> {
    vocab: TokenVocab<T>,
    scores: Vec<f64>,
    trie: Trie,
    unk_id: Option<usize>,
    min_score: f64,
    fuse_unk: bool,
    byte_fallback: bool,
}

impl<T: TokenType> Unigram<T> {
    /// Build a model from `(piece, score)` pairs; ids are positions.
    pub fn new(
        pieces: Vec<(String, f64)>,
        unk_id: Option<usize>,
        byte_fallback: bool,
    ) -> Result<Self> {
        if let Some(unk) = unk_id
            && unk >= pieces.len()
        {
            return Err(TokenizerError::config(
                "model.unk_id",
                format!("unk_id {unk} is outside a vocabulary of {}", pieces.len()),
            ));
        }

        let mut vocab = TokenVocab::default();
        let mut trie = Trie::new();
        let mut scores = Vec::with_capacity(pieces.len());
        let mut min_score = f64::INFINITY;

        for (idx, (piece, score)) in pieces.into_iter().enumerate() {
            if !piece.is_empty() {
                trie.insert(&piece)?;
            }
            vocab.insert(piece, try_token_from_usize(idx)?)?;
            min_score = min_score.min(score);
            scores.push(score);
        }

        log::debug!("Unigram model: {} pieces", scores.len());
        Ok(Self {
            vocab,
            scores,
            trie,
            unk_id,
            min_score,
            fuse_unk: true,
            byte_fallback,
        })
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &TokenVocab<T> {
        &self.vocab
    }

    /// The unknown token id, if any.
    pub fn unk_token_id(&self) -> Option<T> {
        self.unk_id.and_then(|id| try_token_from_usize(id).ok())
    }

    /// The unknown token, if any.
    pub fn unk_token(&self) -> Option<&str> {
        self.vocab.id_to_token(self.unk_token_id()?)
    }

    fn missing_unk(text: &str) -> TokenizerError {
        TokenizerError::MissingUnkToken(text.to_string())
    }

    /// Best segmentation of `text` into pieces.
    pub fn encode(
        &self,
        text: &str,
    ) -> Result<Vec<String>> {
        if text.is_empty() {
            return Ok(vec![]);
        }

        let size = text.len();
        let unk_score = self.min_score - UNK_PENALTY;
        let mut best = vec![BestPath::default(); size + 1];

        let mut starts_at = 0;
        while starts_at < size {
            let score_here = best[starts_at].score;
            let char_len = text[starts_at..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);

            let mut has_single_char = false;
            for piece in self.trie.common_prefix_search(&text[starts_at..]) {
                let ends_at = starts_at + piece.len();
                let Some(id) = self.vocab.token_to_id(piece) else {
                    continue;
                };
                let id = id.to_usize().unwrap_or(usize::MAX);
                let Some(&score) = self.scores.get(id) else {
                    continue;
                };

                let candidate = score_here + score;
                let target = &mut best[ends_at];
                if target.starts_at.is_none() || candidate > target.score {
                    *target = BestPath {
                        id,
                        score: candidate,
                        starts_at: Some(starts_at),
                    };
                }
                has_single_char |= piece.len() == char_len;
            }

            if !has_single_char {
                let candidate = score_here + unk_score;
                let target = &mut best[starts_at + char_len];
                if target.starts_at.is_none() || candidate > target.score {
                    *target = BestPath {
                        id: self.unk_id.ok_or_else(|| Self::missing_unk(text))?,
                        score: candidate,
                        starts_at: Some(starts_at),
                    };
                }
            }
            starts_at += char_len;
        }

        let mut results = Vec::new();
        let mut fused: Vec<&str> = Vec::new();
        let mut ends_at = size;
        while ends_at > 0 {
            let node = best[ends_at];
            let Some(starts_at) = node.starts_at else {
                return Err(Self::missing_unk(text));
            };
            let piece = &text[starts_at..ends_at];

            if self.fuse_unk && Some(node.id) == self.unk_id {
                fused.push(piece);
            } else {
                if !fused.is_empty() {
                    fused.reverse();
                    results.push(fused.concat());
                    fused.clear();
                }
                results.push(piece.to_string());
            }
            ends_at = starts_at;
        }
        if !fused.is_empty() {
            fused.reverse();
            results.push(fused.concat());
        }
        results.reverse();
        Ok(results)
    }

    /// Tokenize one pre-token.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<Token<T>>> {
        let mut tokens = Vec::new();
        for piece in self.encode(text)? {
            if let Some(id) = self.vocab.token_to_id(&piece) {
                tokens.push(Token::new(id, piece));
                continue;
            }

            if self.byte_fallback
                && let Some(bytes) = piece
                    .bytes()
                    .map(|b| {
                        let value = byte_fallback_token(b);
                        Some(Token::new(self.vocab.token_to_id(&value)?, value))
                    })
                    .collect::<Option<Vec<_>>>()
            {
                tokens.extend(bytes);
                continue;
            }

            let unk = self.unk_token_id().ok_or_else(|| Self::missing_unk(&piece))?;
            tokens.push(Token::new(unk, piece));
        }
        Ok(tokens)
    }
}
