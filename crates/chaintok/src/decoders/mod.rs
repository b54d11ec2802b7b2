//! # Decoders
//!
//! Map token strings back to text. Each decoder rewrites the token list;
//! the final text is the concatenation of what the chain leaves behind.

pub mod byte_fallback;
pub mod byte_level;
pub mod metaspace;
pub mod wordpiece;

pub use byte_fallback::{decode_byte_fallback, parse_byte_token};
pub use byte_level::decode_byte_level;
pub use metaspace::decode_metaspace;
pub use wordpiece::{cleanup_tokenization_spaces, decode_wordpiece};

use crate::errors::Result;
use crate::normalizers::Replace;
use crate::pre_tokenizers::{DEFAULT_REPLACEMENT, PrependScheme};
use crate::util::regex::ConfigPattern;
use serde::{Deserialize, Serialize};

fn default_prefix() -> String {
    "##".to_string()
}

fn default_suffix() -> String {
    "</w>".to_string()
}

fn default_replacement() -> char {
    DEFAULT_REPLACEMENT
}

fn default_true() -> bool {
    true
}

/// `decoder` section of `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecoderConfig {
    /// Byte-level alphabet reversal.
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

    /// WordPiece joining.
    WordPiece {
        /// Continuation prefix.
        #[serde(default = "default_prefix")]
        prefix: String,
        /// Remove spaces before punctuation.
        #[serde(default = "default_true")]
        cleanup: bool,
    },

    /// Metaspace marker reversal.
    Metaspace {
        /// Marker char.
        #[serde(default = "default_replacement")]
        replacement: char,
        /// When a marker was prepended.
        #[serde(default)]
        prepend_scheme: Option<PrependScheme>,
        /// Legacy prepend flag.
        #[serde(default)]
        add_prefix_space: Option<bool>,
        /// Ignored.
        #[serde(default = "default_true")]
        split: bool,
    },

    /// End-of-word suffix reversal.
    #[serde(rename = "BPEDecoder")]
    Bpe {
        /// The suffix.
        #[serde(default = "default_suffix")]
        suffix: String,
    },

    /// `<0xNN>` folding.
    ByteFallback,

    /// Join every token into one.
    Fuse,

    /// Remove chars from each token's ends.
    Strip {
        /// The char to remove.
        content: char,
        /// At most this many from the start.
        #[serde(default)]
        start: usize,
        /// At most this many from the end.
        #[serde(default)]
        stop: usize,
    },

    /// Replace a pattern in each token.
    Replace {
        /// The pattern.
        pattern: ConfigPattern,
        /// Replacement text.
        content: String,
    },

    /// Decoders applied in order.
    Sequence {
        /// The decoders.
        decoders: Vec<DecoderConfig>,
    },
}

/// A built decoder.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoder {
    /// Byte-level alphabet reversal.
    ByteLevel,

    /// WordPiece joining.
    WordPiece {
        /// Continuation prefix.
        prefix: String,
        /// Remove spaces before punctuation.
        cleanup: bool,
    },

    /// Metaspace marker reversal.
    Metaspace {
        /// Marker char.
        replacement: char,
        /// When a marker was prepended.
        prepend_scheme: PrependScheme,
    },

    /// End-of-word suffix reversal.
    Bpe {
        /// The suffix.
        suffix: String,
    },

    /// `<0xNN>` folding.
    ByteFallback,

    /// Join every token into one.
    Fuse,

    /// Remove chars from each token's ends.
    Strip {
        /// The char to remove.
        content: char,
        /// At most this many from the start.
        start: usize,
        /// At most this many from the end.
        stop: usize,
    },

    /// Replace a pattern in each token.
    Replace(Replace),

    /// Decoders applied in order.
    Sequence(Vec<Decoder>),
}

fn strip_token(
    token: &str,
    content: char,
    start: usize,
    stop: usize,
) -> String {
    let chars: Vec<char> = token.chars().collect();
    let lead = chars.iter().take(start).take_while(|&&c| c == content).count();
    let trail = chars[lead..]
        .iter()
        .rev()
        .take(stop)
        .take_while(|&&c| c == content)
        .count();
    chars[lead..chars.len() - trail].iter().collect()
}

impl Decoder {
    /// Build a decoder from its config.
    pub fn from_config(config: &DecoderConfig) -> Result<Self> {
        Ok(match config {
            DecoderConfig::ByteLevel { .. } => Self::ByteLevel,
            DecoderConfig::WordPiece { prefix, cleanup } => Self::WordPiece {
                prefix: prefix.clone(),
                cleanup: *cleanup,
            },
            DecoderConfig::Metaspace {
                replacement,
                prepend_scheme,
                add_prefix_space,
                ..
            } => Self::Metaspace {
                replacement: *replacement,
                prepend_scheme: PrependScheme::resolve(*prepend_scheme, *add_prefix_space),
            },
            DecoderConfig::Bpe { suffix } => Self::Bpe {
                suffix: suffix.clone(),
            },
            DecoderConfig::ByteFallback => Self::ByteFallback,
            DecoderConfig::Fuse => Self::Fuse,
            DecoderConfig::Strip {
                content,
                start,
                stop,
            } => Self::Strip {
                content: *content,
                start: *start,
                stop: *stop,
            },
            DecoderConfig::Replace { pattern, content } => {
                Self::Replace(Replace::new(pattern.clone(), content.as_str())?)
            }
            DecoderConfig::Sequence { decoders } => Self::Sequence(
                decoders
                    .iter()
                    .map(Self::from_config)
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }

    /// Rewrite the token list.
    pub fn decode_chain(
        &self,
        tokens: Vec<String>,
    ) -> Result<Vec<String>> {
        Ok(match self {
            Self::ByteLevel => vec![decode_byte_level(&tokens)],
            Self::WordPiece { prefix, cleanup } => decode_wordpiece(tokens, prefix, *cleanup),
            Self::Metaspace {
                replacement,
                prepend_scheme,
            } => decode_metaspace(tokens, *replacement, *prepend_scheme),
            Self::Bpe { suffix } => {
                let n = tokens.len();
                tokens
                    .into_iter()
                    .enumerate()
                    .map(|(i, token)| {
                        token.replace(suffix.as_str(), if i + 1 == n { "" } else { " " })
                    })
                    .collect()
            }
            Self::ByteFallback => decode_byte_fallback(tokens),
            Self::Fuse => vec![tokens.concat()],
            Self::Strip {
                content,
                start,
                stop,
            } => tokens
                .iter()
                .map(|t| strip_token(t, *content, *start, *stop))
                .collect(),
            Self::Replace(replace) => tokens
                .iter()
                .map(|t| replace.replace(t))
                .collect::<Result<Vec<_>>>()?,
            Self::Sequence(decoders) => {
                let mut tokens = tokens;
                for decoder in decoders {
                    tokens = decoder.decode_chain(tokens)?;
                }
                tokens
            }
        })
    }

    /// Decode token strings into text.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, tokens)))]
    pub fn decode(
        &self,
        tokens: Vec<String>,
    ) -> Result<String> {
        Ok(self.decode_chain(tokens)?.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn build(json: &str) -> Decoder {
        Decoder::from_config(&serde_json::from_str(json).unwrap()).unwrap()
    }

    #[test]
    fn test_bpe_suffix() {
        let decoder = build(r#"{"type": "BPEDecoder"}"#);
        assert_eq!(
            decoder.decode(strs(&["hel", "lo</w>", "there</w>"])).unwrap(),
            "hello there"
        );
    }

    #[test]
    fn test_strip() {
        let decoder = build(r#"{"type": "Strip", "content": " ", "start": 1, "stop": 0}"#);
        assert_eq!(
            decoder.decode_chain(strs(&["  a", "b ", " "])).unwrap(),
            vec![" a", "b ", ""]
        );
        assert_eq!(strip_token("xxaxx", 'x', 5, 1), "ax");
    }

    #[test]
    fn test_llama_style_sequence() {
        let decoder = build(
            r#"{
                "type": "Sequence",
                "decoders": [
                    {"type": "Replace", "pattern": {"String": "▁"}, "content": " "},
                    {"type": "ByteFallback"},
                    {"type": "Fuse"},
                    {"type": "Strip", "content": " ", "start": 1, "stop": 0}
                ]
            }"#,
        );
        assert_eq!(
            decoder
                .decode(strs(&["▁Hey", "<0x0A>", "▁friend", "<0xE5>", "<0x8F>", "<0xAB>"]))
                .unwrap(),
            "Hey\n friend叫"
        );
    }

    #[test]
    fn test_metaspace_legacy_flag() {
        let decoder = build(r#"{"type": "Metaspace", "add_prefix_space": false}"#);
        assert_eq!(
            decoder,
            Decoder::Metaspace {
                replacement: '▁',
                prepend_scheme: PrependScheme::Never,
            }
        );
        assert_eq!(decoder.decode(strs(&["▁a"])).unwrap(), " a");
    }

    #[test]
    fn test_wordpiece_defaults() {
        let decoder = build(r#"{"type": "WordPiece"}"#);
        assert_eq!(decoder.decode(strs(&["ma", "##ka", "."])).unwrap(), "maka.");
    }

    #[test]
    fn test_byte_level() {
        let decoder = build(r#"{"type": "ByteLevel", "add_prefix_space": true}"#);
        assert_eq!(decoder.decode(strs(&["Hello", "Ġworld"])).unwrap(), "Hello world");
    }

    #[test]
    fn test_unknown_type() {
        assert!(serde_json::from_str::<DecoderConfig>(r#"{"type": "CTC"}"#).is_err());
    }
}
