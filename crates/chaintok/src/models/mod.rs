//! # Subword Models
//!
//! Map a single pre-token to subword tokens. The model is picked by the
//! `type` of the `model` section.

pub mod bpe;
pub mod unigram;
pub mod wordlevel;
pub mod wordpiece;

pub use bpe::{Bpe, BpeOptions};
pub use unigram::Unigram;
pub use wordlevel::WordLevel;
pub use wordpiece::WordPiece;

use crate::errors::{Result, TokenizerError};
use crate::types::{TokenType, try_token_from_u64};
use crate::vocab::TokenVocab;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A subword token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token<T: TokenType> {
    /// The token id.
    pub id: T,

    /// The token string.
    pub value: String,
}

impl<T: TokenType> Token<T> {
    /// Create a new token.
    pub fn new<S: Into<String>>(
        id: T,
        value: S,
    ) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

/// A merge list entry: `"a b"` or `["a", "b"]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MergeEntry {
    /// The pair form.
    Pair(String, String),

    /// The space-separated form.
    Legacy(String),
}

impl MergeEntry {
    /// Split into `(left, right)`.
    pub fn to_pair(&self) -> Result<(String, String)> {
        match self {
            Self::Pair(a, b) => Ok((a.clone(), b.clone())),
            Self::Legacy(s) => s
                .split_once(' ')
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .ok_or_else(|| {
                    TokenizerError::config("model.merges", format!("malformed merge {s:?}"))
                }),
        }
    }
}

fn default_unk() -> String {
    "[UNK]".to_string()
}

fn default_prefix() -> String {
    wordpiece::DEFAULT_CONTINUING_SUBWORD_PREFIX.to_string()
}

fn default_max_chars() -> usize {
    wordpiece::DEFAULT_MAX_INPUT_CHARS_PER_WORD
}

/// `model` section of `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms)]
pub enum ModelConfig {
    /// Byte-pair encoding.
    BPE {
        /// Token to id.
        vocab: AHashMap<String, u64>,
        /// Ordered merges.
        #[serde(default)]
        merges: Vec<MergeEntry>,
        /// Merge dropout; ignored.
        #[serde(default)]
        dropout: Option<f32>,
        /// Unknown token.
        #[serde(default)]
        unk_token: Option<String>,
        /// Prefix for non-initial symbols.
        #[serde(default)]
        continuing_subword_prefix: Option<String>,
        /// Suffix for the final symbol.
        #[serde(default)]
        end_of_word_suffix: Option<String>,
        /// Merge consecutive unknowns.
        #[serde(default)]
        fuse_unk: bool,
        /// `<0xNN>` fallback.
        #[serde(default)]
        byte_fallback: bool,
        /// Emit whole in-vocabulary words directly.
        #[serde(default)]
        ignore_merges: bool,
    },
    /// Greedy longest-prefix.
    WordPiece {
        /// Token to id.
        vocab: AHashMap<String, u64>,
        /// Unknown token.
        #[serde(default = "default_unk")]
        unk_token: String,
        /// Continuation prefix.
        #[serde(default = "default_prefix")]
        continuing_subword_prefix: String,
        /// Longer words are unknown.
        #[serde(default = "default_max_chars")]
        max_input_chars_per_word: usize,
    },
    /// SentencePiece unigram.
    Unigram {
        /// `(piece, score)`; ids are positions.
        vocab: Vec<(String, f64)>,
        /// Unknown piece id.
        #[serde(default)]
        unk_id: Option<usize>,
        /// `<0xNN>` fallback.
        #[serde(default)]
        byte_fallback: bool,
    },
    /// Whole-word lookup.
    WordLevel {
        /// Token to id.
        vocab: AHashMap<String, u64>,
        /// Unknown token.
        #[serde(default)]
        unk_token: Option<String>,
    },
}

fn build_vocab<T: TokenType>(vocab: &AHashMap<String, u64>) -> Result<TokenVocab<T>> {
    TokenVocab::from_pairs(
        vocab
            .iter()
            .map(|(s, &id)| Ok((s.clone(), try_token_from_u64(id)?)))
            .collect::<Result<Vec<_>>>()?,
    )
}

/// A built subword model.
#[derive(Clone, Debug)]
pub enum Model<T: TokenType> {
    /// Byte-pair encoding.
    Bpe(Bpe<T>),
    /// Greedy longest-prefix.
    WordPiece(WordPiece<T>),
    /// SentencePiece unigram.
    Unigram(Unigram<T>),
    /// Whole-word lookup.
    WordLevel(WordLevel<T>),
}

impl<T: TokenType> Model<T> {
    /// Build a model from its config.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Ok(match config {
            ModelConfig::BPE {
                vocab,
                merges,
                dropout,
                unk_token,
                continuing_subword_prefix,
                end_of_word_suffix,
                fuse_unk,
                byte_fallback,
                ignore_merges,
            } => {
                if let Some(p) = dropout
                    && *p > 0.0
                {
                    log::warn!("BPE dropout {p} ignored; encoding is deterministic");
                }
                let merges = merges
                    .iter()
                    .map(MergeEntry::to_pair)
                    .collect::<Result<Vec<_>>>()?;
                let options = BpeOptions::default()
                    .with_unk_token(unk_token.clone())
                    .with_continuing_subword_prefix(continuing_subword_prefix.clone())
                    .with_end_of_word_suffix(end_of_word_suffix.clone())
                    .with_fuse_unk(*fuse_unk)
                    .with_byte_fallback(*byte_fallback)
                    .with_ignore_merges(*ignore_merges);
                Self::Bpe(Bpe::new(build_vocab(vocab)?, &merges, options)?)
            }
            ModelConfig::WordPiece {
                vocab,
                unk_token,
                continuing_subword_prefix,
                max_input_chars_per_word,
            } => Self::WordPiece(WordPiece::new(
                build_vocab(vocab)?,
                unk_token.clone(),
                continuing_subword_prefix.clone(),
                *max_input_chars_per_word,
            )?),
            ModelConfig::Unigram {
                vocab,
                unk_id,
                byte_fallback,
            } => Self::Unigram(Unigram::new(vocab.clone(), *unk_id, *byte_fallback)?),
            ModelConfig::WordLevel { vocab, unk_token } => {
                Self::WordLevel(WordLevel::new(build_vocab(vocab)?, unk_token.as_deref()))
            }
        })
    }

    /// The model's vocabulary.
    pub fn vocab(&self) -> &TokenVocab<T> {
        match self {
            Self::Bpe(m) => m.vocab(),
            Self::WordPiece(m) => m.vocab(),
            Self::Unigram(m) => m.vocab(),
            Self::WordLevel(m) => m.vocab(),
        }
    }

    /// Tokenize one pre-token.
    pub fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<Token<T>>> {
        match self {
            Self::Bpe(m) => m.tokenize(text),
            Self::WordPiece(m) => Ok(m.tokenize(text)),
            Self::Unigram(m) => m.tokenize(text),
            Self::WordLevel(m) => m.tokenize(text),
        }
    }

    /// Look up a token id.
    pub fn token_to_id(
        &self,
        token: &str,
    ) -> Option<T> {
        self.vocab().token_to_id(token)
    }

    /// Look up a token string.
    pub fn id_to_token(
        &self,
        id: T,
    ) -> Option<&str> {
        self.vocab().id_to_token(id)
    }

    /// The unknown token, if any.
    pub fn unk_token(&self) -> Option<&str> {
        match self {
            Self::Bpe(m) => m.unk_token(),
            Self::WordPiece(m) => Some(m.unk_token()),
            Self::Unigram(m) => m.unk_token(),
            Self::WordLevel(m) => m.unk_token(),
        }
    }

    /// The unknown token id, if any.
    pub fn unk_token_id(&self) -> Option<T> {
        match self {
            Self::Bpe(m) => m.unk_token_id(),
            Self::WordPiece(m) => Some(m.unk_token_id()),
            Self::Unigram(m) => m.unk_token_id(),
            Self::WordLevel(m) => m.unk_token_id(),
        }
    }

    /// The number of distinct ids.
    pub fn vocab_size(&self) -> usize {
        self.vocab().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(json: &str) -> Model<u32> {
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        Model::from_config(&config).unwrap()
    }

    #[test]
    fn test_bpe_both_merge_forms() {
        let legacy = build(
            r#"{"type": "BPE", "vocab": {"a": 0, "b": 1, "ab": 2}, "merges": ["a b"]}"#,
        );
        let pairs = build(
            r#"{"type": "BPE", "vocab": {"a": 0, "b": 1, "ab": 2}, "merges": [["a", "b"]], "dropout": 0.1}"#,
        );
        for model in [legacy, pairs] {
            let tokens = model.tokenize("ab").unwrap();
            assert_eq!(tokens, vec![Token::new(2, "ab")]);
            assert_eq!(model.unk_token(), None);
            assert_eq!(model.vocab_size(), 3);
        }
    }

    #[test]
    fn test_wordpiece_defaults() {
        let model = build(r###"{"type": "WordPiece", "vocab": {"[UNK]": 0, "hi": 1, "##ya": 2}}"###);
        assert_eq!(model.unk_token(), Some("[UNK]"));
        assert_eq!(model.unk_token_id(), Some(0));
        assert_eq!(
            model.tokenize("hiya").unwrap(),
            vec![Token::new(1, "hi"), Token::new(2, "##ya")]
        );
    }

    #[test]
    fn test_vocab_round_trip() {
        let model = build(
            r#"{"type": "WordLevel", "vocab": {"<unk>": 0, "x": 1, "y": 2}, "unk_token": "<unk>"}"#,
        );
        for (token, id) in model.vocab().iter() {
            assert_eq!(model.id_to_token(id), Some(token));
            assert_eq!(model.token_to_id(token), Some(id));
        }
    }

    #[test]
    fn test_config_errors() {
        let bad_merge: ModelConfig = serde_json::from_str(
            r#"{"type": "BPE", "vocab": {"a": 0}, "merges": ["ab"]}"#,
        )
        .unwrap();
        assert!(Model::<u32>::from_config(&bad_merge).is_err());

        let dup: ModelConfig =
            serde_json::from_str(r#"{"type": "WordLevel", "vocab": {"a": 0, "b": 0}}"#).unwrap();
        assert!(Model::<u32>::from_config(&dup).is_err());

        let too_big: ModelConfig = serde_json::from_str(
            r#"{"type": "WordLevel", "vocab": {"a": 70000}}"#,
        )
        .unwrap();
        assert!(Model::<u16>::from_config(&too_big).is_err());

        assert!(serde_json::from_str::<ModelConfig>(r#"{"type": "Mystery", "vocab": {}}"#).is_err());
    }
}
