//! # Tokenizer Configuration Documents
//!
//! Model hubs publish a tokenizer as `tokenizer.json` (pipeline stages and
//! vocabulary) plus `tokenizer_config.json` (special-token roles, flags and
//! the chat template).

pub mod loader;
pub mod tokenizer_config;
pub mod tokenizer_json;

pub use loader::TokenizerFiles;
pub use tokenizer_config::{ChatTemplateConfig, NamedChatTemplate, SpecialTokenValue, TokenizerConfig};
pub use tokenizer_json::{AddedTokenConfig, TokenizerJson};
