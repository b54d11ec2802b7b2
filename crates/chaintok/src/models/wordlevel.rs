//! # Word-Level Model

use crate::errors::{Result, TokenizerError};
use crate::models::Token;
use crate::types::TokenType;
use crate::vocab::TokenVocab;

/// Whole pre-token lookup.
#[derive(Clone, Debug)]
pub struct WordLevel<T: TokenType> {
    vocab: TokenVocab<T>,
    unk: Option<(String, T)>,
}

impl<T: TokenType> WordLevel<T> {
    /// Build a model; an `unk_token` missing from the vocabulary is ignored.
    pub fn new(
        vocab: TokenVocab<T>,
        unk_token: Option<&str>,
    ) -> Self {
        let unk = unk_token.and_then(|u| Some((u.to_string(), vocab.token_to_id(u)?)));
        Self { vocab, unk }
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &TokenVocab<T> {
        &self.vocab
    }

    /// The unknown token, if any.
    pub fn unk_token(&self) -> Option<&str> {
        self.unk.as_ref().map(|(s, _)| s.as_str())
    }

    /// The unknown token id, if any.
    pub fn unk_token_id(&self) -> Option<T> {
        self.unk.as_ref().map(|(_, id)| *id)
    }

    /// Tokenize one pre-token.
    pub fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<Token<T>>> {
        if let Some(id) = self.vocab.token_to_id(text) {
            return Ok(vec![Token::new(id, text)]);
        }
        match &self.unk {
            Some((unk, id)) => Ok(vec![Token::new(*id, unk.as_str())]),
            None => Err(TokenizerError::MissingUnkToken(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let vocab = TokenVocab::from_pairs([("<unk>", 0), ("hello", 1)]).unwrap();
        let wl = WordLevel::<u32>::new(vocab.clone(), Some("<unk>"));
        assert_eq!(wl.tokenize("hello").unwrap(), vec![Token::new(1, "hello")]);
        assert_eq!(wl.tokenize("bye").unwrap(), vec![Token::new(0, "<unk>")]);

        let strict = WordLevel::<u32>::new(vocab, None);
        assert!(matches!(
            strict.tokenize("bye"),
            Err(TokenizerError::MissingUnkToken(_))
        ));
    }
}
