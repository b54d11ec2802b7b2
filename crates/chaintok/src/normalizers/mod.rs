//! # Normalizers
//!
//! Pure text-to-text transforms, selected by the `type` field of the
//! `normalizer` section and composed strictly left to right.

mod bert;
mod precompiled;
mod replace;

pub use bert::{BertNormalizer, strip_accents};
pub use precompiled::Precompiled;
pub use replace::Replace;

use crate::errors::{Result, TokenizerError};
use crate::util::regex::ConfigPattern;
use crate::vocab::ByteTable;
use base64::Engine;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

fn default_true() -> bool {
    true
}

/// `normalizer` section of `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms)]
pub enum NormalizerConfig {
    /// Unicode lowercase.
    Lowercase,
    /// Canonical composition.
    NFC,
    /// Canonical decomposition.
    NFD,
    /// Compatibility composition.
    NFKC,
    /// Compatibility decomposition.
    NFKD,
    /// BERT cleanup.
    BertNormalizer {
        /// Remove control chars, map whitespace to spaces.
        #[serde(default = "default_true")]
        clean_text: bool,
        /// Pad CJK ideographs with spaces.
        #[serde(default = "default_true")]
        handle_chinese_chars: bool,
        /// Strip accents; follows `lowercase` when unset.
        #[serde(default)]
        strip_accents: Option<bool>,
        /// Lowercase.
        #[serde(default = "default_true")]
        lowercase: bool,
    },
    /// NFD, then drop non-spacing marks.
    StripAccents,
    /// Trim whitespace.
    #[serde(alias = "StripNormalizer")]
    Strip {
        /// Trim the left side.
        #[serde(default = "default_true")]
        strip_left: bool,
        /// Trim the right side.
        #[serde(default = "default_true")]
        strip_right: bool,
    },
    /// SentencePiece precompiled charmap, base64 encoded.
    Precompiled {
        /// The serialized charmap.
        #[serde(default)]
        precompiled_charsmap: Option<String>,
    },
    /// Pattern replacement.
    Replace {
        /// What to replace.
        pattern: ConfigPattern,
        /// The replacement.
        content: String,
    },
    /// Prepend a fixed string to non-empty text.
    Prepend {
        /// The prefix.
        prepend: String,
    },
    /// SentencePiece NMT control-character rules.
    Nmt,
    /// Remap UTF-8 bytes into the byte-level alphabet.
    ByteLevel,
    /// A nested chain.
    Sequence {
        /// The chain, applied in order.
        normalizers: Vec<NormalizerConfig>,
    },
}

/// Unicode normalization form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum NormalizationForm {
    /// Canonical composition.
    NFC,
    /// Canonical decomposition.
    NFD,
    /// Compatibility composition.
    NFKC,
    /// Compatibility decomposition.
    NFKD,
}

/// A built normalizer.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalizer {
    /// Unicode lowercase.
    Lowercase,
    /// A Unicode normalization form.
    Unicode(NormalizationForm),
    /// BERT cleanup.
    Bert(BertNormalizer),
    /// NFD, then drop non-spacing marks.
    StripAccents,
    /// Trim whitespace.
    Strip {
        /// Trim the left side.
        left: bool,
        /// Trim the right side.
        right: bool,
    },
    /// Precompiled charmap.
    Precompiled(Box<Precompiled>),
    /// Pattern replacement.
    Replace(Replace),
    /// Prepend a fixed string to non-empty text.
    Prepend(String),
    /// SentencePiece NMT rules.
    Nmt,
    /// Byte-level alphabet remap.
    ByteLevel,
    /// A chain, applied in order.
    Sequence(Vec<Normalizer>),
}

impl Normalizer {
    /// Build a normalizer from its config.
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        Ok(match config {
            NormalizerConfig::Lowercase => Self::Lowercase,
            NormalizerConfig::NFC => Self::Unicode(NormalizationForm::NFC),
            NormalizerConfig::NFD => Self::Unicode(NormalizationForm::NFD),
            NormalizerConfig::NFKC => Self::Unicode(NormalizationForm::NFKC),
            NormalizerConfig::NFKD => Self::Unicode(NormalizationForm::NFKD),
            NormalizerConfig::BertNormalizer {
                clean_text,
                handle_chinese_chars,
                strip_accents,
                lowercase,
            } => Self::Bert(BertNormalizer {
                clean_text: *clean_text,
                handle_chinese_chars: *handle_chinese_chars,
                strip_accents: strip_accents.unwrap_or(*lowercase),
                lowercase: *lowercase,
            }),
            NormalizerConfig::StripAccents => Self::StripAccents,
            NormalizerConfig::Strip {
                strip_left,
                strip_right,
            } => Self::Strip {
                left: *strip_left,
                right: *strip_right,
            },
            NormalizerConfig::Precompiled {
                precompiled_charsmap,
            } => match precompiled_charsmap.as_deref() {
                // An empty charmap is a no-op.
                None | Some("") => Self::Sequence(vec![]),
                Some(encoded) => {
                    let bytes = base64::engine::general_purpose::STANDARD
                        .decode(encoded)
                        .map_err(|e| {
                            TokenizerError::config("normalizer.precompiled_charsmap", e)
                        })?;
                    Self::Precompiled(Box::new(Precompiled::from_bytes(&bytes)?))
                }
            },
            NormalizerConfig::Replace { pattern, content } => {
                Self::Replace(Replace::new(pattern.clone(), content.clone())?)
            }
            NormalizerConfig::Prepend { prepend } => Self::Prepend(prepend.clone()),
            NormalizerConfig::Nmt => Self::Nmt,
            NormalizerConfig::ByteLevel => Self::ByteLevel,
            NormalizerConfig::Sequence { normalizers } => Self::Sequence(
                normalizers
                    .iter()
                    .map(Self::from_config)
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Normalize text.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, text)))]
    pub fn normalize(
        &self,
        text: &str,
    ) -> Result<String> {
        Ok(match self {
            Self::Lowercase => text.to_lowercase(),
            Self::Unicode(form) => match form {
                NormalizationForm::NFC => text.nfc().collect(),
                NormalizationForm::NFD => text.nfd().collect(),
                NormalizationForm::NFKC => text.nfkc().collect(),
                NormalizationForm::NFKD => text.nfkd().collect(),
            },
            Self::Bert(bert) => bert.normalize(text),
            Self::StripAccents => strip_accents(text),
            Self::Strip { left, right } => {
                let mut s = text;
                if *left {
                    s = s.trim_start();
                }
                if *right {
                    s = s.trim_end();
                }
                s.to_string()
            }
            Self::Precompiled(p) => p.normalize(text),
            Self::Replace(r) => r.replace(text)?,
            Self::Prepend(prefix) if !text.is_empty() => format!("{prefix}{text}"),
            Self::Prepend(_) => String::new(),
            Self::Nmt => nmt(text),
            Self::ByteLevel => ByteTable::gpt2().encode_str(text),
            Self::Sequence(chain) => {
                let mut s = text.to_string();
                for n in chain {
                    s = n.normalize(&s)?;
                }
                s
            }
        })
    }
}

/// SentencePiece NMT rules: drop C0/C1 control chars, map odd spaces to `' '`.
fn nmt(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            !matches!(
                c as u32,
                0x0001..=0x0008 | 0x000B | 0x000E..=0x001F | 0x007F | 0x008F | 0x009F
            )
        })
        .map(|c| {
            if matches!(
                c as u32,
                0x0009
                    | 0x000A
                    | 0x000C
                    | 0x000D
                    | 0x1680
                    | 0x200B..=0x200F
                    | 0x2028
                    | 0x2029
                    | 0x2581
                    | 0xFEFF
                    | 0xFFFD
            ) {
                ' '
            } else {
                c
            }
        })
        .collect()
}
