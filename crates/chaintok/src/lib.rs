//! # Hub Tokenizer Pipelines
//!
//! Builds tokenizers from the `tokenizer.json` / `tokenizer_config.json` pair
//! that model hubs publish next to a model, and runs the full pipeline:
//!
//! ```text
//! raw text
//!   -> added tokens (trie match)
//!   -> normalizers -> pre-tokenizers -> model (BPE / WordPiece / ...)
//!   -> post-processor (special tokens, type ids)
//!   -> Encoding
//! ```
//!
//! Decoding walks the other way through a decoder chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use chaintok::tokenizer::Tokenizer;
//!
//! let tokenizer: Tokenizer = Tokenizer::from_dir("models/bert-base-uncased")?;
//!
//! let ids = tokenizer.encode("Hello world!", true)?;
//! let text = tokenizer.decode(&ids, true)?;
//! ```
#![warn(missing_docs, unused)]

pub mod config;
pub mod decoders;
pub mod encoding;
pub mod errors;
pub mod models;
pub mod normalizers;
pub mod pre_tokenizers;
pub mod processors;
pub mod tokenizer;
pub mod trie;
pub mod types;
pub mod util;
pub mod vocab;

pub use encoding::Encoding;
pub use errors::{Result, TokenizerError};
pub use tokenizer::{Tokenizer, TokenizerBuilder};

/// Default value for parallel batch processing; based on the `rayon` feature.
#[cfg(feature = "rayon")]
pub const DEFAULT_PARALLEL: bool = true;
#[cfg(not(feature = "rayon"))]
pub const DEFAULT_PARALLEL: bool = false;

/// Constant guess for the expected bytes/token ratio.
pub const BYTES_PER_TOKEN_HINT: f64 = 4.0;
