//! # Template Post-Processing
//!
//! Templates are lists of pieces:
//!
//! ```text
//! single: [CLS] $A [SEP]
//! pair:   [CLS] $A [SEP] $B:1 [SEP]:1
//! ```
//!
//! `$A` / `$B` stand for the input sequences, any other name for a special
//! token declared in `special_tokens`. A `:n` suffix sets the type id.

use crate::encoding::Encoding;
use crate::errors::{Result, TokenizerError};
use crate::types::{TokenType, try_token_from_u64};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Which input sequence a template piece stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceId {
    /// The first input.
    A,

    /// The pair input.
    B,
}

/// One piece of a template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Piece {
    /// An input sequence.
    Sequence {
        /// Which input.
        id: SequenceId,
        /// Type id assigned to its tokens.
        type_id: u32,
    },

    /// A declared special token.
    SpecialToken {
        /// Key into the special-token table.
        id: String,
        /// Type id assigned to its tokens.
        type_id: u32,
    },
}

impl Piece {
    /// Parse a `$A`, `$B:1`, `[SEP]:1`, ... piece.
    pub fn parse(text: &str) -> Result<Self> {
        let (name, type_id) = match text.rsplit_once(':') {
            Some((name, digits)) if !name.is_empty() => {
                let type_id = digits.parse::<u32>().map_err(|_| {
                    TokenizerError::config(
                        "post_processor",
                        format!("bad type id in template piece {text:?}"),
                    )
                })?;
                (name, type_id)
            }
            _ => (text, 0),
        };

        if let Some(rest) = name.strip_prefix('$') {
            let (id, type_id) = match rest {
                "" | "A" | "a" => (SequenceId::A, type_id),
                "B" | "b" => (SequenceId::B, type_id),
                digits => {
                    let type_id = digits.parse::<u32>().map_err(|_| {
                        TokenizerError::config(
                            "post_processor",
                            format!("bad sequence in template piece {text:?}"),
                        )
                    })?;
                    (SequenceId::A, type_id)
                }
            };
            Ok(Self::Sequence { id, type_id })
        } else {
            Ok(Self::SpecialToken {
                id: name.to_string(),
                type_id,
            })
        }
    }
}

/// A template as it appears in `tokenizer.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateConfig {
    /// Structured pieces.
    Pieces(Vec<Piece>),

    /// Piece strings.
    Words(Vec<String>),

    /// One whitespace-separated string.
    Text(String),
}

impl TemplateConfig {
    /// Resolve into pieces.
    pub fn to_pieces(&self) -> Result<Vec<Piece>> {
        match self {
            Self::Pieces(pieces) => Ok(pieces.clone()),
            Self::Words(words) => words.iter().map(|w| Piece::parse(w)).collect(),
            Self::Text(text) => text.split_whitespace().map(Piece::parse).collect(),
        }
    }
}

/// A declared special token; one name may expand to several ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokenConfig {
    /// The name used in templates.
    pub id: String,

    /// Ids emitted for the name.
    pub ids: Vec<u64>,

    /// Token strings, parallel to `ids`.
    pub tokens: Vec<String>,
}

/// Post-processing from `single` / `pair` templates.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateProcessor<T: TokenType> {
    single: Vec<Piece>,
    pair: Vec<Piece>,
    special_tokens: AHashMap<String, Vec<(T, String)>>,
}

impl<T: TokenType> TemplateProcessor<T> {
    /// Build and validate a template processor.
    pub fn new(
        single: &TemplateConfig,
        pair: &TemplateConfig,
        special_tokens: &AHashMap<String, SpecialTokenConfig>,
    ) -> Result<Self> {
        let mut table = AHashMap::with_capacity(special_tokens.len());
        for (name, special) in special_tokens {
            if special.ids.len() != special.tokens.len() {
                return Err(TokenizerError::config(
                    "post_processor.special_tokens",
                    format!("{name:?} has {} ids but {} tokens", special.ids.len(), special.tokens.len()),
                ));
            }
            let entries = special
                .ids
                .iter()
                .zip(&special.tokens)
                .map(|(&id, token)| Ok((try_token_from_u64(id)?, token.clone())))
                .collect::<Result<Vec<_>>>()?;
            table.insert(name.clone(), entries);
        }

        let processor = Self {
            single: single.to_pieces()?,
            pair: pair.to_pieces()?,
            special_tokens: table,
        };

        if processor
            .single
            .iter()
            .any(|p| matches!(p, Piece::Sequence { id: SequenceId::B, .. }))
        {
            return Err(TokenizerError::config(
                "post_processor.single",
                "the single template cannot use $B",
            ));
        }
        for piece in processor.single.iter().chain(&processor.pair) {
            if let Piece::SpecialToken { id, .. } = piece
                && !processor.special_tokens.contains_key(id)
            {
                return Err(TokenizerError::config(
                    "post_processor.special_tokens",
                    format!("template uses undeclared special token {id:?}"),
                ));
            }
        }
        Ok(processor)
    }

    /// The number of tokens the template inserts.
    pub fn added_tokens(
        &self,
        is_pair: bool,
    ) -> usize {
        let template = if is_pair { &self.pair } else { &self.single };
        template
            .iter()
            .map(|piece| match piece {
                Piece::SpecialToken { id, .. } => {
                    self.special_tokens.get(id).map_or(0, Vec::len)
                }
                Piece::Sequence { .. } => 0,
            })
            .sum()
    }

    /// Lay out the inputs along the template.
    pub fn apply(
        &self,
        encoding: Encoding<T>,
        pair: Option<Encoding<T>>,
        add_special_tokens: bool,
    ) -> Encoding<T> {
        let template = if pair.is_some() { &self.pair } else { &self.single };
        let mut inputs = [Some(encoding), pair];

        let mut out = Encoding::with_capacity(
            inputs.iter().flatten().map(Encoding::len).sum::<usize>() + self.added_tokens(inputs[1].is_some()),
        );
        for piece in template {
            match piece {
                Piece::Sequence { id, type_id } => {
                    let slot = match id {
                        SequenceId::A => 0,
                        SequenceId::B => 1,
                    };
                    if let Some(mut part) = inputs[slot].take() {
                        part.set_type_ids(*type_id);
                        out.extend(part);
                    }
                }
                Piece::SpecialToken { id, type_id } => {
                    if !add_special_tokens {
                        continue;
                    }
                    for (token_id, token) in self.special_tokens.get(id).into_iter().flatten() {
                        out.push(*token_id, token.as_str(), *type_id, true);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bert_template() -> TemplateProcessor<u32> {
        let special: AHashMap<String, SpecialTokenConfig> = serde_json::from_str(
            r#"{
                "[CLS]": {"id": "[CLS]", "ids": [101], "tokens": ["[CLS]"]},
                "[SEP]": {"id": "[SEP]", "ids": [102], "tokens": ["[SEP]"]}
            }"#,
        )
        .unwrap();
        TemplateProcessor::new(
            &TemplateConfig::Text("[CLS] $A [SEP]".to_string()),
            &TemplateConfig::Text("[CLS] $A [SEP] $B:1 [SEP]:1".to_string()),
            &special,
        )
        .unwrap()
    }

    fn seq(ids: &[u32]) -> Encoding<u32> {
        let mut e = Encoding::default();
        for &id in ids {
            e.push(id, format!("t{id}"), 0, false);
        }
        e
    }

    #[test]
    fn test_parse_pieces() {
        assert_eq!(
            Piece::parse("$B:1").unwrap(),
            Piece::Sequence { id: SequenceId::B, type_id: 1 }
        );
        assert_eq!(
            Piece::parse("$").unwrap(),
            Piece::Sequence { id: SequenceId::A, type_id: 0 }
        );
        assert_eq!(
            Piece::parse("$1").unwrap(),
            Piece::Sequence { id: SequenceId::A, type_id: 1 }
        );
        assert_eq!(
            Piece::parse("[SEP]:1").unwrap(),
            Piece::SpecialToken { id: "[SEP]".to_string(), type_id: 1 }
        );
        assert!(Piece::parse("[SEP]:x").is_err());
    }

    #[test]
    fn test_structured_config() {
        let config: TemplateConfig = serde_json::from_str(
            r#"[{"SpecialToken": {"id": "<s>", "type_id": 0}}, {"Sequence": {"id": "A", "type_id": 0}}]"#,
        )
        .unwrap();
        assert_eq!(config.to_pieces().unwrap().len(), 2);
    }

    #[test]
    fn test_apply() {
        let template = bert_template();
        assert_eq!(template.added_tokens(false), 2);
        assert_eq!(template.added_tokens(true), 3);

        let single = template.apply(seq(&[5, 6]), None, true);
        assert_eq!(single.ids(), &[101, 5, 6, 102]);
        assert_eq!(single.special_tokens_mask(), &[1, 0, 0, 1]);

        let pair = template.apply(seq(&[5]), Some(seq(&[7])), true);
        assert_eq!(pair.ids(), &[101, 5, 102, 7, 102]);
        assert_eq!(pair.type_ids(), &[0, 0, 0, 1, 1]);

        let bare = template.apply(seq(&[5]), Some(seq(&[7])), false);
        assert_eq!(bare.ids(), &[5, 7]);
        assert_eq!(bare.type_ids(), &[0, 1]);
    }

    #[test]
    fn test_validation() {
        let empty = AHashMap::new();
        let undeclared = TemplateProcessor::<u32>::new(
            &TemplateConfig::Text("[CLS] $A".to_string()),
            &TemplateConfig::Text("$A $B".to_string()),
            &empty,
        );
        assert!(undeclared.is_err());

        let single_b = TemplateProcessor::<u32>::new(
            &TemplateConfig::Text("$A $B".to_string()),
            &TemplateConfig::Text("$A $B".to_string()),
            &empty,
        );
        assert!(single_b.is_err());
    }
}
