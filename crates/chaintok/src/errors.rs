//! # Error Types

use thiserror::Error;

/// Result type alias using [`TokenizerError`].
pub type Result<T> = std::result::Result<T, TokenizerError>;

/// Errors raised while building or running a tokenizer.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// A configuration field is missing, malformed, or names an unknown variant.
    #[error("invalid `{field}` configuration: {message}")]
    Config {
        /// The offending field, e.g. `pre_tokenizer` or `model.merges`.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regex pattern failed to compile or to match.
    #[error("regex error: {0}")]
    Regex(String),

    /// A token id does not fit in the configured token type.
    #[error("token id {0} out of range for the token type")]
    TokenOutOfRange(u64),

    /// The model met an unknown symbol and has no unknown token to map it to.
    #[error("no unknown token configured; cannot encode {0:?}")]
    MissingUnkToken(String),

    /// A token id has no entry in the vocabulary.
    #[error("token id {0} is not in the vocabulary")]
    UnknownId(u64),

    /// Neither the configuration nor the caller supplied a chat template.
    #[error("no chat template is configured and none was supplied")]
    MissingChatTemplate,

    /// The chat template failed to compile or render.
    #[error("chat template error: {0}")]
    ChatTemplate(String),
}

impl TokenizerError {
    /// Build a [`TokenizerError::Config`] error.
    pub fn config<F, M>(
        field: F,
        message: M,
    ) -> Self
    where
        F: Into<String>,
        M: ToString,
    {
        Self::Config {
            field: field.into(),
            message: message.to_string(),
        }
    }
}
