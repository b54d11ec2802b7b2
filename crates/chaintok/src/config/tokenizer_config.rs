//! # `tokenizer_config.json`
//!
//! The generic tokenizer settings: special-token roles, BOS/EOS flags and
//! the chat template. Unknown keys are ignored.

use crate::errors::Result;
use crate::vocab::AddedToken;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A special token given either as a string or as a token object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecialTokenValue {
    /// Just the content.
    Text(String),

    /// A full token object.
    Token(AddedToken),
}

impl SpecialTokenValue {
    /// The token content.
    pub fn content(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Token(t) => &t.content,
        }
    }

    /// The token as an [`AddedToken`], marked special.
    pub fn to_added_token(&self) -> AddedToken {
        match self {
            Self::Text(s) => AddedToken::new(s.as_str(), true),
            Self::Token(t) => {
                let mut t = t.clone();
                t.special = true;
                t
            }
        }
    }
}

/// A named chat template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedChatTemplate {
    /// Template name; `default` is used when none is requested.
    pub name: String,

    /// Template source.
    pub template: String,
}

/// `chat_template`: one template, or a list of named ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatTemplateConfig {
    /// A single template.
    Single(String),

    /// Named templates.
    Named(Vec<NamedChatTemplate>),
}

impl ChatTemplateConfig {
    /// Pick a template by name; `None` asks for the default.
    pub fn get(
        &self,
        name: Option<&str>,
    ) -> Option<&str> {
        match (self, name) {
            (Self::Single(t), None | Some("default")) => Some(t),
            (Self::Single(_), Some(_)) => None,
            (Self::Named(list), name) => {
                let name = name.unwrap_or("default");
                list.iter()
                    .find(|t| t.name == name)
                    .map(|t| t.template.as_str())
            }
        }
    }
}

/// The parsed `tokenizer_config.json` document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Beginning-of-sequence token.
    pub bos_token: Option<SpecialTokenValue>,
    /// End-of-sequence token.
    pub eos_token: Option<SpecialTokenValue>,
    /// Unknown token.
    pub unk_token: Option<SpecialTokenValue>,
    /// Padding token.
    pub pad_token: Option<SpecialTokenValue>,
    /// Classifier token.
    pub cls_token: Option<SpecialTokenValue>,
    /// Separator token.
    pub sep_token: Option<SpecialTokenValue>,
    /// Mask token.
    pub mask_token: Option<SpecialTokenValue>,

    /// Extra special tokens with no role.
    pub additional_special_tokens: Vec<SpecialTokenValue>,

    /// Added tokens keyed by their id, as a string.
    pub added_tokens_decoder: AHashMap<String, AddedToken>,

    /// The chat template(s).
    pub chat_template: Option<ChatTemplateConfig>,

    /// Prepend BOS when no post-processor is configured.
    pub add_bos_token: Option<bool>,
    /// Append EOS when no post-processor is configured.
    pub add_eos_token: Option<bool>,

    /// Remove spaces before punctuation after decoding.
    pub clean_up_tokenization_spaces: Option<bool>,

    /// Maximum model input length; often a huge float meaning "none".
    pub model_max_length: Option<f64>,

    /// The tokenizer class name.
    pub tokenizer_class: Option<String>,
}

impl TokenizerConfig {
    /// Parse a `tokenizer_config.json` document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The model length limit, if it is a usable number.
    pub fn max_length(&self) -> Option<usize> {
        self.model_max_length
            .filter(|&n| n.is_finite() && n >= 0.0 && n < 1e15)
            .map(|n| n as usize)
    }
}
