//! # Byte-Pair Encoding Model

mod cache;
mod word;

pub use cache::{DEFAULT_CACHE_CAPACITY, WordCache};
pub use word::Word;

use crate::errors::{Result, TokenizerError};
use crate::models::Token;
use crate::types::TokenType;
use crate::vocab::{MergeRanks, TokenVocab};

/// The byte-fallback token for a byte, e.g. `<0x0A>`.
pub fn byte_fallback_token(byte: u8) -> String {
    format!("<{byte:#04X}>")
}

/// Options for [`Bpe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BpeOptions {
    /// Token for symbols missing from the vocabulary.
    pub unk_token: Option<String>,

    /// Prefix for every symbol but the first.
    pub continuing_subword_prefix: Option<String>,

    /// Suffix for the last symbol.
    pub end_of_word_suffix: Option<String>,

    /// Merge consecutive unknown symbols into one.
    pub fuse_unk: bool,

    /// Map unknown symbols to `<0xNN>` byte tokens.
    pub byte_fallback: bool,

    /// Emit whole words found in the vocabulary without merging.
    pub ignore_merges: bool,

    /// Word cache capacity; `0` disables the cache.
    pub cache_capacity: usize,
}

impl Default for BpeOptions {
    fn default() -> Self {
        Self {
            unk_token: None,
            continuing_subword_prefix: None,
            end_of_word_suffix: None,
            fuse_unk: false,
            byte_fallback: false,
            ignore_merges: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl BpeOptions {
    /// Set the unknown token.
    pub fn with_unk_token<S: Into<String>>(
        self,
        unk_token: Option<S>,
    ) -> Self {
        Self {
            unk_token: unk_token.map(Into::into),
            ..self
        }
    }

    /// Set the continuing subword prefix.
    pub fn with_continuing_subword_prefix<S: Into<String>>(
        self,
        prefix: Option<S>,
    ) -> Self {
        Self {
            continuing_subword_prefix: prefix.map(Into::into),
            ..self
        }
    }

    /// Set the end of word suffix.
    pub fn with_end_of_word_suffix<S: Into<String>>(
        self,
        suffix: Option<S>,
    ) -> Self {
        Self {
            end_of_word_suffix: suffix.map(Into::into),
            ..self
        }
    }

    /// Set `fuse_unk`.
    pub fn with_fuse_unk(
        self,
        fuse_unk: bool,
    ) -> Self {
        Self { fuse_unk, ..self }
    }

    /// Set `byte_fallback`.
    pub fn with_byte_fallback(
        self,
        byte_fallback: bool,
    ) -> Self {
        Self {
            byte_fallback,
            ..self
        }
    }

    /// Set `ignore_merges`.
    pub fn with_ignore_merges(
        self,
        ignore_merges: bool,
    ) -> Self {
        Self {
            ignore_merges,
            ..self
        }
    }

    /// Set the cache capacity.
    pub fn with_cache_capacity(
        self,
        cache_capacity: usize,
    ) -> Self {
        Self {
            cache_capacity,
            ..self
        }
    }
}

/// BPE model over a string vocabulary and a ranked merge table.
#[derive(Clone, Debug)]
pub struct Bpe<T: TokenType> {
    vocab: TokenVocab<T>,
    merges: MergeRanks<T>,
    options: BpeOptions,
    unk_id: Option<T>,
    cache: WordCache<Word<T>>,
}

impl<T: TokenType> Bpe<T> {
    /// Build a model from a vocabulary and an ordered merge list.
    pub fn new<S: AsRef<str>>(
        vocab: TokenVocab<T>,
        merges: &[(S, S)],
        options: BpeOptions,
    ) -> Result<Self> {
        let ranks =
            MergeRanks::from_merges(merges, &vocab, options.continuing_subword_prefix.as_deref())?;

        let unk_id = match &options.unk_token {
            Some(unk) => match vocab.token_to_id(unk) {
                Some(id) => Some(id),
                None => {
                    log::warn!("BPE unk_token {unk:?} is not in the vocabulary; ignoring it");
                    None
                }
            },
            None => None,
        };

        log::debug!(
            "BPE model: {} tokens, {} merges, byte_fallback={}",
            vocab.len(),
            ranks.len(),
            options.byte_fallback
        );

        let cache = WordCache::new(options.cache_capacity);
        Ok(Self {
            vocab,
            merges: ranks,
            options,
            unk_id,
            cache,
        })
    }

    /// The options.
    pub fn options(&self) -> &BpeOptions {
        &self.options
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &TokenVocab<T> {
        &self.vocab
    }

    /// The merge table.
    pub fn merges(&self) -> &MergeRanks<T> {
        &self.merges
    }

    /// The unknown token id, if configured and present.
    pub fn unk_token_id(&self) -> Option<T> {
        self.unk_id
    }

    /// The unknown token, if configured and present.
    pub fn unk_token(&self) -> Option<&str> {
        self.unk_id.and(self.options.unk_token.as_deref())
    }

    /// Clear the word cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Split a word into initial symbols.
    fn merge_word(
        &self,
        word: &str,
    ) -> Word<T> {
        let mut out = Word::with_capacity(word.len());
        let mut unk: Option<(T, usize)> = None;

        let mut chars = word.char_indices().peekable();
        while let Some((start, c)) = chars.next() {
            let is_first = start == 0;
            let is_last = chars.peek().is_none();
            let byte_len = c.len_utf8();

            let mut symbol = String::with_capacity(byte_len);
            if !is_first && let Some(prefix) = &self.options.continuing_subword_prefix {
                symbol.push_str(prefix);
            }
            symbol.push(c);
            if is_last && let Some(suffix) = &self.options.end_of_word_suffix {
                symbol.push_str(suffix);
            }

            if let Some(id) = self.vocab.token_to_id(&symbol) {
                if let Some((unk_id, unk_len)) = unk.take() {
                    out.add(unk_id, unk_len);
                }
                out.add(id, byte_len);
                continue;
            }

            if self.options.byte_fallback
                && let Some(ids) = symbol
                    .bytes()
                    .map(|b| self.vocab.token_to_id(&byte_fallback_token(b)))
                    .collect::<Option<Vec<_>>>()
            {
                for id in ids {
                    out.add(id, 1);
                }
                continue;
            }

            // With no unknown token, the symbol is dropped.
            if let Some(unk_id) = self.unk_id {
                unk = match unk {
                    Some((id, len)) if self.options.fuse_unk => Some((id, len + byte_len)),
                    Some((id, len)) => {
                        out.add(id, len);
                        Some((unk_id, byte_len))
                    }
                    None => Some((unk_id, byte_len)),
                };
            }
        }
        if let Some((unk_id, unk_len)) = unk {
            out.add(unk_id, unk_len);
        }

        out.merge_all(&self.merges);
        out
    }

    fn word_to_tokens(
        &self,
        word: &Word<T>,
    ) -> Result<Vec<Token<T>>> {
        word.ids().map(|id| self.token_for_id(id)).collect()
    }

    fn token_for_id(
        &self,
        id: T,
    ) -> Result<Token<T>> {
        let value = self
            .vocab
            .id_to_token(id)
            .ok_or_else(|| TokenizerError::UnknownId(crate::types::token_to_u64(id)))?;
        Ok(Token::new(id, value))
    }

    /// Tokenize one pre-token.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<Token<T>>> {
        if text.is_empty() {
            return Ok(vec![]);
        }

        if self.options.ignore_merges
            && let Some(id) = self.vocab.token_to_id(text)
        {
            return Ok(vec![Token::new(id, text)]);
        }

        if let Some(word) = self.cache.get(text) {
            return self.word_to_tokens(&word);
        }

        let word = self.merge_word(text);
        let tokens = self.word_to_tokens(&word)?;
        self.cache.set(text, word);
        Ok(tokens)
    }
}
