//! # Pre-Tokenizers
//!
//! Split normalized text into spans that the subword model sees one at a
//! time. Chains are a flat-map: each stage splits every span produced by
//! the stage before it.

mod byte_level;
mod metaspace;
pub mod split;

pub use byte_level::{ByteLevel, GPT2_PATTERN};
pub use metaspace::{DEFAULT_REPLACEMENT, Metaspace, PrependScheme};
pub use split::{SplitBehavior, SplitMatcher};

use crate::errors::Result;
use crate::util::regex::{ConfigPattern, compile_supplier};
use crate::util::unicode::is_punctuation;
use serde::{Deserialize, Serialize};
use split::split_pre_token;

fn default_true() -> bool {
    true
}

/// A span of pre-tokenized text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreToken {
    /// The span text; may be rewritten by the pre-tokenizer.
    pub text: String,

    /// Byte offset of the span start in the pre-tokenizer input.
    pub offset: usize,
}

impl PreToken {
    /// Create a new span.
    pub fn new<S: Into<String>>(
        text: S,
        offset: usize,
    ) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }
}

/// The working set of spans for one piece of normalized text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreTokenizedString {
    splits: Vec<PreToken>,
    at_sequence_start: bool,
}

impl PreTokenizedString {
    /// Start from a single span.
    ///
    /// `at_sequence_start` marks text that begins the original input.
    pub fn new(
        text: &str,
        at_sequence_start: bool,
    ) -> Self {
        let splits = if text.is_empty() {
            vec![]
        } else {
            vec![PreToken::new(text, 0)]
        };
        Self {
            splits,
            at_sequence_start,
        }
    }

    /// Does this text begin the original input?
    pub fn at_sequence_start(&self) -> bool {
        self.at_sequence_start
    }

    /// Replace every span with its sub-spans; empty spans are dropped.
    pub fn split<F>(
        &mut self,
        mut f: F,
    ) -> Result<()>
    where
        F: FnMut(&PreToken) -> Result<Vec<PreToken>>,
    {
        let mut next = Vec::with_capacity(self.splits.len());
        for token in &self.splits {
            next.extend(f(token)?.into_iter().filter(|t| !t.text.is_empty()));
        }
        self.splits = next;
        Ok(())
    }

    /// Rewrite every span in place.
    pub fn map<F>(
        &mut self,
        f: F,
    ) where
        F: FnMut(&PreToken) -> PreToken,
    {
        self.splits = self.splits.iter().map(f).collect();
    }

    /// The spans.
    pub fn splits(&self) -> &[PreToken] {
        &self.splits
    }

    /// The span texts.
    pub fn texts(&self) -> Vec<&str> {
        self.splits.iter().map(|t| t.text.as_str()).collect()
    }

    /// Consume into the spans.
    pub fn into_splits(self) -> Vec<PreToken> {
        self.splits
    }
}

/// `pre_tokenizer` section of `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreTokenizerConfig {
    /// Words and punctuation runs; whitespace dropped.
    Whitespace,
    /// Split on whitespace runs.
    WhitespaceSplit,
    /// Whitespace split, then isolated punctuation.
    BertPreTokenizer,
    /// Punctuation split.
    Punctuation {
        /// Delimiter behavior.
        #[serde(default)]
        behavior: SplitBehavior,
    },
    /// Byte-level remap.
    ByteLevel {
        /// Prepend a space to each span.
        #[serde(default = "default_true")]
        add_prefix_space: bool,
        /// Split on the GPT-2 pattern first.
        #[serde(default = "default_true")]
        use_regex: bool,
    },
    /// Digit split.
    Digits {
        /// One span per digit.
        #[serde(default)]
        individual_digits: bool,
    },
    /// Generic pattern split.
    Split {
        /// What to split on.
        pattern: ConfigPattern,
        /// Delimiter behavior.
        behavior: SplitBehavior,
        /// Split on non-matches instead.
        #[serde(default)]
        invert: bool,
    },
    /// Metaspace marker.
    Metaspace {
        /// The marker char.
        #[serde(default = "default_replacement")]
        replacement: char,
        /// When to prepend the marker.
        #[serde(default)]
        prepend_scheme: Option<PrependScheme>,
        /// Legacy flag; `false` means never prepend.
        #[serde(default)]
        add_prefix_space: Option<bool>,
        /// Split before each marker.
        #[serde(default = "default_true")]
        split: bool,
    },
    /// Split on a single delimiter char, dropping it.
    CharDelimiterSplit {
        /// The delimiter.
        delimiter: char,
    },
    /// A nested chain.
    Sequence {
        /// The chain, applied in order.
        pretokenizers: Vec<PreTokenizerConfig>,
    },
}

fn default_replacement() -> char {
    DEFAULT_REPLACEMENT
}

/// A built pre-tokenizer.
#[derive(Clone, Debug)]
pub enum PreTokenizer {
    /// Split with a matcher and behavior.
    Split {
        /// Delimiter matcher.
        matcher: SplitMatcher,
        /// Delimiter behavior.
        behavior: SplitBehavior,
        /// Split on non-matches instead.
        invert: bool,
    },
    /// Byte-level remap.
    ByteLevel(ByteLevel),
    /// Metaspace marker.
    Metaspace(Metaspace),
    /// A chain, applied in order.
    Sequence(Vec<PreTokenizer>),
}

impl PreTokenizer {
    /// Words and punctuation runs; whitespace dropped.
    pub fn whitespace() -> Result<Self> {
        Ok(Self::Split {
            matcher: SplitMatcher::Regex(compile_supplier(r"\w+|[^\w\s]+")?),
            behavior: SplitBehavior::Removed,
            invert: true,
        })
    }

    /// Split on whitespace runs.
    pub fn whitespace_split() -> Self {
        Self::Split {
            matcher: SplitMatcher::Char(char::is_whitespace),
            behavior: SplitBehavior::Removed,
            invert: false,
        }
    }

    /// Split off punctuation.
    pub fn punctuation(behavior: SplitBehavior) -> Self {
        Self::Split {
            matcher: SplitMatcher::Char(is_punctuation),
            behavior,
            invert: false,
        }
    }

    /// The BERT pre-tokenizer.
    pub fn bert() -> Self {
        Self::Sequence(vec![
            Self::whitespace_split(),
            Self::punctuation(SplitBehavior::Isolated),
        ])
    }

    /// Build a pre-tokenizer from its config.
    pub fn from_config(config: &PreTokenizerConfig) -> Result<Self> {
        Ok(match config {
            PreTokenizerConfig::Whitespace => Self::whitespace()?,
            PreTokenizerConfig::WhitespaceSplit => Self::whitespace_split(),
            PreTokenizerConfig::BertPreTokenizer => Self::bert(),
            PreTokenizerConfig::Punctuation { behavior } => Self::punctuation(*behavior),
            PreTokenizerConfig::ByteLevel {
                add_prefix_space,
                use_regex,
            } => Self::ByteLevel(ByteLevel::new(*add_prefix_space, *use_regex)?),
            PreTokenizerConfig::Digits { individual_digits } => Self::Split {
                matcher: SplitMatcher::Char(char::is_numeric),
                behavior: if *individual_digits {
                    SplitBehavior::Isolated
                } else {
                    SplitBehavior::Contiguous
                },
                invert: false,
            },
            PreTokenizerConfig::Split {
                pattern,
                behavior,
                invert,
            } => Self::Split {
                matcher: SplitMatcher::Regex(compile_supplier(pattern)?),
                behavior: *behavior,
                invert: *invert,
            },
            PreTokenizerConfig::Metaspace {
                replacement,
                prepend_scheme,
                add_prefix_space,
                split,
            } => Self::Metaspace(Metaspace {
                replacement: *replacement,
                prepend_scheme: PrependScheme::resolve(*prepend_scheme, *add_prefix_space),
                split: *split,
            }),
            PreTokenizerConfig::CharDelimiterSplit { delimiter } => Self::Split {
                matcher: SplitMatcher::CharEq(*delimiter),
                behavior: SplitBehavior::Removed,
                invert: false,
            },
            PreTokenizerConfig::Sequence { pretokenizers } => Self::Sequence(
                pretokenizers
                    .iter()
                    .map(Self::from_config)
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Pre-tokenize in place.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, pts)))]
    pub fn pre_tokenize(
        &self,
        pts: &mut PreTokenizedString,
    ) -> Result<()> {
        match self {
            Self::Split {
                matcher,
                behavior,
                invert,
            } => pts.split(|token| split_pre_token(token, matcher, *behavior, *invert)),
            Self::ByteLevel(bl) => bl.pre_tokenize(pts),
            Self::Metaspace(m) => m.pre_tokenize(pts),
            Self::Sequence(chain) => {
                for p in chain {
                    p.pre_tokenize(pts)?;
                }
                Ok(())
            }
        }
    }

    /// Pre-tokenize a string into span texts.
    pub fn pre_tokenize_str(
        &self,
        text: &str,
    ) -> Result<Vec<String>> {
        let mut pts = PreTokenizedString::new(text, true);
        self.pre_tokenize(&mut pts)?;
        Ok(pts.into_splits().into_iter().map(|t| t.text).collect())
    }

    /// The byte-level stage, if this chain contains one.
    pub fn byte_level(&self) -> Option<&ByteLevel> {
        match self {
            Self::ByteLevel(bl) => Some(bl),
            Self::Sequence(chain) => chain.iter().find_map(Self::byte_level),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(json: &str) -> PreTokenizer {
        let config: PreTokenizerConfig = serde_json::from_str(json).unwrap();
        PreTokenizer::from_config(&config).unwrap()
    }

    #[test]
    fn test_whitespace() {
        let p = build(r#"{"type": "Whitespace"}"#);
        assert_eq!(
            p.pre_tokenize_str("Hey man!  How's it going?").unwrap(),
            vec!["Hey", "man", "!", "How", "'", "s", "it", "going", "?"]
        );
        assert!(p.pre_tokenize_str("   ").unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_split() {
        let p = build(r#"{"type": "WhitespaceSplit"}"#);
        assert_eq!(
            p.pre_tokenize_str(" Hey man!\tok ").unwrap(),
            vec!["Hey", "man!", "ok"]
        );
    }

    #[test]
    fn test_bert() {
        let p = build(r#"{"type": "BertPreTokenizer"}"#);
        assert_eq!(
            p.pre_tokenize_str("Hey friend!     How are you?!?").unwrap(),
            vec!["Hey", "friend", "!", "How", "are", "you", "?", "!", "?"]
        );
    }

    #[test]
    fn test_punctuation() {
        let p = build(r#"{"type": "Punctuation"}"#);
        assert_eq!(
            p.pre_tokenize_str("Hey friend!, ok").unwrap(),
            vec!["Hey friend", "!", ",", " ok"]
        );

        let merged = build(r#"{"type": "Punctuation", "behavior": "MergedWithPrevious"}"#);
        assert_eq!(
            merged.pre_tokenize_str("Hey friend!, ok").unwrap(),
            vec!["Hey friend!", ",", " ok"]
        );
    }

    #[test]
    fn test_digits() {
        let grouped = build(r#"{"type": "Digits", "individual_digits": false}"#);
        assert_eq!(
            grouped.pre_tokenize_str("Call 123 now").unwrap(),
            vec!["Call ", "123", " now"]
        );

        let single = build(r#"{"type": "Digits", "individual_digits": true}"#);
        assert_eq!(
            single.pre_tokenize_str("Call 123").unwrap(),
            vec!["Call ", "1", "2", "3"]
        );
    }

    #[test]
    fn test_split_config() {
        let p = build(
            r#"{"type": "Split", "pattern": {"String": "-"}, "behavior": "MergedWithNext", "invert": false}"#,
        );
        assert_eq!(
            p.pre_tokenize_str("a-b-c").unwrap(),
            vec!["a", "-b", "-c"]
        );

        let d = build(r#"{"type": "CharDelimiterSplit", "delimiter": "|"}"#);
        assert_eq!(d.pre_tokenize_str("a|b||c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_metaspace_config() {
        let p = build(
            r#"{"type": "Metaspace", "replacement": "▁", "add_prefix_space": false}"#,
        );
        assert_eq!(p.pre_tokenize_str("Hey you").unwrap(), vec!["Hey", "▁you"]);

        let p = build(
            r#"{"type": "Metaspace", "replacement": "▁", "prepend_scheme": "always", "split": false}"#,
        );
        assert_eq!(p.pre_tokenize_str("Hey you").unwrap(), vec!["▁Hey▁you"]);
    }

    #[test]
    fn test_sequence_flat_maps() {
        let p = build(
            r#"{"type": "Sequence", "pretokenizers": [
                {"type": "WhitespaceSplit"},
                {"type": "Digits", "individual_digits": true}
            ]}"#,
        );
        assert_eq!(
            p.pre_tokenize_str("ab12 c3").unwrap(),
            vec!["ab", "1", "2", "c", "3"]
        );
        assert!(p.byte_level().is_none());

        let bl = build(
            r#"{"type": "Sequence", "pretokenizers": [{"type": "ByteLevel", "add_prefix_space": false}]}"#,
        );
        assert!(bl.byte_level().is_some());
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(serde_json::from_str::<PreTokenizerConfig>(r#"{"type": "Nope"}"#).is_err());
    }
}
