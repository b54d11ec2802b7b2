//! # Post-Processors
//!
//! Insert structural special tokens around encoded sequences and assign
//! type ids. Built from the `post_processor` section of `tokenizer.json`,
//! or, when that section is absent, from the BOS/EOS settings of
//! `tokenizer_config.json`.

pub mod roberta;
pub mod template;

pub use roberta::{BertProcessor, RobertaProcessor, trim_token};
pub use template::{Piece, SequenceId, SpecialTokenConfig, TemplateConfig, TemplateProcessor};

use crate::encoding::Encoding;
use crate::errors::Result;
use crate::types::{TokenType, try_token_from_u64};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// `post_processor` section of `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PostProcessorConfig {
    /// Template layout.
    TemplateProcessing {
        /// Single-input template.
        single: TemplateConfig,
        /// Pair template.
        pair: TemplateConfig,
        /// Declared special tokens.
        #[serde(default)]
        special_tokens: AHashMap<String, SpecialTokenConfig>,
    },

    /// BERT layout.
    BertProcessing {
        /// `(token, id)` separator.
        sep: (String, u64),
        /// `(token, id)` classifier.
        cls: (String, u64),
    },

    /// RoBERTa layout with token trimming.
    RobertaProcessing {
        /// `(token, id)` separator.
        sep: (String, u64),
        /// `(token, id)` classifier.
        cls: (String, u64),
        /// Trim token whitespace.
        #[serde(default = "default_true")]
        trim_offsets: bool,
        /// Keep one space when trimming.
        #[serde(default = "default_true")]
        add_prefix_space: bool,
    },

    /// Passthrough; the fields only matter for offsets.
    ByteLevel {
        /// Ignored.
        #[serde(default)]
        add_prefix_space: bool,
        /// Ignored.
        #[serde(default)]
        trim_offsets: bool,
        /// Ignored.
        #[serde(default)]
        use_regex: bool,
    },

    /// Processors applied in order.
    Sequence {
        /// The processors.
        processors: Vec<PostProcessorConfig>,
    },
}

/// BOS/EOS wrapping used when `tokenizer.json` has no post-processor.
///
/// Single input is `[bos] A [eos]` per the `add_*` flags; pair input is
/// `[bos] A [sep] B [sep]`, where `sep` falls back to the EOS token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefaultProcessor<T: TokenType> {
    bos: Option<(String, T)>,
    eos: Option<(String, T)>,
    sep: Option<(String, T)>,
    add_bos: bool,
    add_eos: bool,
}

impl<T: TokenType> DefaultProcessor<T> {
    /// Create a processor; a flag for a missing token is ignored.
    pub fn new(
        bos: Option<(String, T)>,
        eos: Option<(String, T)>,
        sep: Option<(String, T)>,
        add_bos: bool,
        add_eos: bool,
    ) -> Self {
        Self {
            add_bos: add_bos && bos.is_some(),
            add_eos: add_eos && eos.is_some(),
            bos,
            eos,
            sep,
        }
    }

    fn separator(&self) -> Option<&(String, T)> {
        self.sep.as_ref().or(self.eos.as_ref())
    }

    /// The number of tokens inserted.
    pub fn added_tokens(
        &self,
        is_pair: bool,
    ) -> usize {
        let bos = self.add_bos as usize;
        if is_pair {
            bos + 2 * self.separator().is_some() as usize
        } else {
            bos + self.add_eos as usize
        }
    }

    /// Wrap the inputs.
    pub fn apply(
        &self,
        encoding: Encoding<T>,
        pair: Option<Encoding<T>>,
        add_special_tokens: bool,
    ) -> Encoding<T> {
        if !add_special_tokens {
            return Encoding::merge([Some(encoding), pair].into_iter().flatten());
        }

        let mut out = Encoding::with_capacity(encoding.len() + 3);
        if self.add_bos
            && let Some((token, id)) = &self.bos
        {
            out.push(*id, token.as_str(), 0, true);
        }
        out.extend(encoding);

        match pair {
            None => {
                if self.add_eos
                    && let Some((token, id)) = &self.eos
                {
                    out.push(*id, token.as_str(), 0, true);
                }
            }
            Some(pair) => {
                let sep = self.separator();
                if let Some((token, id)) = sep {
                    out.push(*id, token.as_str(), 0, true);
                }
                out.extend(pair);
                if let Some((token, id)) = sep {
                    out.push(*id, token.as_str(), 1, true);
                }
            }
        }
        out
    }
}

/// A built post-processor.
#[derive(Clone, Debug, PartialEq)]
pub enum PostProcessor<T: TokenType> {
    /// BOS/EOS wrapping.
    Default(DefaultProcessor<T>),

    /// Template layout.
    Template(TemplateProcessor<T>),

    /// BERT layout.
    Bert(BertProcessor<T>),

    /// RoBERTa layout.
    Roberta(RobertaProcessor<T>),

    /// Passthrough.
    ByteLevel,

    /// Processors applied in order.
    Sequence(Vec<PostProcessor<T>>),
}

impl<T: TokenType> Default for PostProcessor<T> {
    fn default() -> Self {
        Self::Default(DefaultProcessor::default())
    }
}

fn special_pair<T: TokenType>(pair: &(String, u64)) -> Result<(String, T)> {
    Ok((pair.0.clone(), try_token_from_u64(pair.1)?))
}

fn split_parts<T: TokenType>(parts: Vec<Encoding<T>>) -> (Encoding<T>, Option<Encoding<T>>) {
    let mut iter = parts.into_iter();
    (iter.next().unwrap_or_default(), iter.next())
}

impl<T: TokenType> PostProcessor<T> {
    /// Build a post-processor from its config.
    pub fn from_config(config: &PostProcessorConfig) -> Result<Self> {
        Ok(match config {
            PostProcessorConfig::TemplateProcessing {
                single,
                pair,
                special_tokens,
            } => Self::Template(TemplateProcessor::new(single, pair, special_tokens)?),
            PostProcessorConfig::BertProcessing { sep, cls } => Self::Bert(BertProcessor {
                sep: special_pair(sep)?,
                cls: special_pair(cls)?,
            }),
            PostProcessorConfig::RobertaProcessing {
                sep,
                cls,
                trim_offsets,
                add_prefix_space,
            } => Self::Roberta(RobertaProcessor {
                sep: special_pair(sep)?,
                cls: special_pair(cls)?,
                trim_offsets: *trim_offsets,
                add_prefix_space: *add_prefix_space,
            }),
            PostProcessorConfig::ByteLevel { .. } => Self::ByteLevel,
            PostProcessorConfig::Sequence { processors } => Self::Sequence(
                processors
                    .iter()
                    .map(Self::from_config)
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }

    /// The number of special tokens inserted for one input or a pair.
    pub fn added_tokens(
        &self,
        is_pair: bool,
    ) -> usize {
        match self {
            Self::Default(p) => p.added_tokens(is_pair),
            Self::Template(p) => p.added_tokens(is_pair),
            Self::Bert(p) => p.added_tokens(is_pair),
            Self::Roberta(p) => p.added_tokens(is_pair),
            Self::ByteLevel => 0,
            Self::Sequence(ps) => ps.iter().map(|p| p.added_tokens(is_pair)).sum(),
        }
    }

    fn process_parts(
        &self,
        parts: Vec<Encoding<T>>,
        add_special_tokens: bool,
    ) -> Vec<Encoding<T>> {
        let merged = match self {
            Self::ByteLevel => return parts,
            Self::Sequence(ps) => {
                return ps
                    .iter()
                    .fold(parts, |parts, p| p.process_parts(parts, add_special_tokens));
            }
            Self::Default(p) => {
                let (encoding, pair) = split_parts(parts);
                p.apply(encoding, pair, add_special_tokens)
            }
            Self::Template(p) => {
                let (encoding, pair) = split_parts(parts);
                p.apply(encoding, pair, add_special_tokens)
            }
            Self::Bert(p) => {
                let (encoding, pair) = split_parts(parts);
                p.apply(encoding, pair, add_special_tokens)
            }
            Self::Roberta(p) => {
                let (encoding, pair) = split_parts(parts);
                p.apply(encoding, pair, add_special_tokens)
            }
        };
        vec![merged]
    }

    /// Combine an input (and optional pair) into the final encoding.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn process(
        &self,
        encoding: Encoding<T>,
        pair: Option<Encoding<T>>,
        add_special_tokens: bool,
    ) -> Encoding<T> {
        let parts = [Some(encoding), pair].into_iter().flatten().collect();
        Encoding::merge(self.process_parts(parts, add_special_tokens))
    }
}
