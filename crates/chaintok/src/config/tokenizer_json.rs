//! # `tokenizer.json`
//!
//! Each section is parsed on its own so that errors name the section.

use crate::decoders::DecoderConfig;
use crate::errors::{Result, TokenizerError};
use crate::models::ModelConfig;
use crate::normalizers::NormalizerConfig;
use crate::pre_tokenizers::PreTokenizerConfig;
use crate::processors::PostProcessorConfig;
use crate::tokenizer::truncation::{PaddingParams, TruncationParams};
use crate::vocab::AddedToken;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An `added_tokens` entry: a token and its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedTokenConfig {
    /// The token id.
    pub id: u64,

    /// The token.
    #[serde(flatten)]
    pub token: AddedToken,
}

/// The parsed `tokenizer.json` document.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenizerJson {
    /// Added tokens.
    pub added_tokens: Vec<AddedTokenConfig>,

    /// Normalizer, if any.
    pub normalizer: Option<NormalizerConfig>,

    /// Pre-tokenizer, if any.
    pub pre_tokenizer: Option<PreTokenizerConfig>,

    /// The subword model.
    pub model: ModelConfig,

    /// Post-processor, if any.
    pub post_processor: Option<PostProcessorConfig>,

    /// Decoder, if any.
    pub decoder: Option<DecoderConfig>,

    /// Truncation, if enabled.
    pub truncation: Option<TruncationParams>,

    /// Padding, if enabled.
    pub padding: Option<PaddingParams>,
}

fn section<D: DeserializeOwned>(
    doc: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<D>> {
    match doc.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| TokenizerError::config(field, e)),
    }
}

/// Older files omit the model `type`; infer it from the fields present.
fn infer_model_type(model: &mut Map<String, Value>) {
    if model.contains_key("type") {
        return;
    }
    let kind = if model.contains_key("merges") {
        "BPE"
    } else if model.get("vocab").is_some_and(Value::is_array) {
        "Unigram"
    } else if model.contains_key("continuing_subword_prefix")
        || model.contains_key("max_input_chars_per_word")
    {
        "WordPiece"
    } else {
        "WordLevel"
    };
    log::debug!("model section has no type; inferred {kind}");
    model.insert("type".to_string(), Value::String(kind.to_string()));
}

impl TokenizerJson {
    /// Parse a `tokenizer.json` document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parse an already-decoded `tokenizer.json` document.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut doc) = value else {
            return Err(TokenizerError::config("tokenizer.json", "expected a JSON object"));
        };

        let mut model = match doc.remove("model") {
            Some(Value::Object(model)) => model,
            _ => return Err(TokenizerError::config("model", "missing model section")),
        };
        infer_model_type(&mut model);
        let model = serde_json::from_value(Value::Object(model))
            .map_err(|e| TokenizerError::config("model", e))?;

        Ok(Self {
            added_tokens: section(&mut doc, "added_tokens")?.unwrap_or_default(),
            normalizer: section(&mut doc, "normalizer")?,
            pre_tokenizer: section(&mut doc, "pre_tokenizer")?,
            model,
            post_processor: section(&mut doc, "post_processor")?,
            decoder: section(&mut doc, "decoder")?,
            truncation: section(&mut doc, "truncation")?,
            padding: section(&mut doc, "padding")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document() {
        let doc = TokenizerJson::from_json_str(
            r#"{
                "version": "1.0",
                "added_tokens": [
                    {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false,
                     "rstrip": false, "normalized": false, "special": true}
                ],
                "normalizer": {"type": "Lowercase"},
                "pre_tokenizer": null,
                "model": {"type": "WordLevel", "vocab": {"[PAD]": 0, "a": 1}, "unk_token": "[PAD]"}
            }"#,
        )
        .unwrap();

        assert_eq!(doc.added_tokens.len(), 1);
        assert_eq!(doc.added_tokens[0].id, 0);
        assert!(doc.added_tokens[0].token.special);
        assert_eq!(doc.normalizer, Some(NormalizerConfig::Lowercase));
        assert!(doc.pre_tokenizer.is_none());
        assert!(doc.decoder.is_none());
        assert!(matches!(doc.model, ModelConfig::WordLevel { .. }));
    }

    #[test]
    fn test_infers_model_type() {
        let bpe = TokenizerJson::from_json_str(
            r#"{"model": {"vocab": {"a": 0, "b": 1, "ab": 2}, "merges": ["a b"]}}"#,
        )
        .unwrap();
        assert!(matches!(bpe.model, ModelConfig::BPE { .. }));

        let unigram =
            TokenizerJson::from_json_str(r#"{"model": {"vocab": [["a", -1.0]], "unk_id": 0}}"#)
                .unwrap();
        assert!(matches!(unigram.model, ModelConfig::Unigram { .. }));

        let wordpiece = TokenizerJson::from_json_str(
            r#"{"model": {"vocab": {"[UNK]": 0}, "max_input_chars_per_word": 100}}"#,
        )
        .unwrap();
        assert!(matches!(wordpiece.model, ModelConfig::WordPiece { .. }));
    }

    #[test]
    fn test_errors_name_the_section() {
        let err = TokenizerJson::from_json_str(
            r#"{"model": {"type": "WordLevel", "vocab": {}}, "pre_tokenizer": {"type": "Nope"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TokenizerError::Config { ref field, .. } if field == "pre_tokenizer"));

        let err = TokenizerJson::from_json_str(r#"{"normalizer": null}"#).unwrap_err();
        assert!(matches!(err, TokenizerError::Config { ref field, .. } if field == "model"));

        assert!(matches!(
            TokenizerJson::from_json_str("not json"),
            Err(TokenizerError::Json(_))
        ));
    }
}
