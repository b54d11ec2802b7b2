//! # WordPiece Model

use crate::errors::{Result, TokenizerError};
use crate::models::Token;
use crate::types::TokenType;
use crate::vocab::TokenVocab;

/// Default continuation prefix.
pub const DEFAULT_CONTINUING_SUBWORD_PREFIX: &str = "##";

/// Default maximum word length, in chars.
pub const DEFAULT_MAX_INPUT_CHARS_PER_WORD: usize = 100;

/// Greedy longest-prefix subword model.
///
/// Any word that cannot be covered completely maps to the single unknown
/// token.
#[derive(Clone, Debug)]
pub struct WordPiece<T: TokenType> {
    vocab: TokenVocab<T>,
    unk_token: String,
    unk_id: T,
    continuing_subword_prefix: String,
    max_input_chars_per_word: usize,
}

impl<T: TokenType> WordPiece<T> {
    /// Build a model.
    ///
    /// # Errors
    /// If `unk_token` is not in the vocabulary.
    pub fn new<S: Into<String>>(
        vocab: TokenVocab<T>,
        unk_token: S,
        continuing_subword_prefix: S,
        max_input_chars_per_word: usize,
    ) -> Result<Self> {
        let unk_token = unk_token.into();
        let unk_id = vocab
            .token_to_id(&unk_token)
            .ok_or_else(|| TokenizerError::MissingUnkToken(unk_token.clone()))?;

        log::debug!("WordPiece model: {} tokens", vocab.len());
        Ok(Self {
            vocab,
            unk_token,
            unk_id,
            continuing_subword_prefix: continuing_subword_prefix.into(),
            max_input_chars_per_word,
        })
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &TokenVocab<T> {
        &self.vocab
    }

    /// The unknown token.
    pub fn unk_token(&self) -> &str {
        &self.unk_token
    }

    /// The unknown token id.
    pub fn unk_token_id(&self) -> T {
        self.unk_id
    }

    /// The continuation prefix.
    pub fn continuing_subword_prefix(&self) -> &str {
        &self.continuing_subword_prefix
    }

    fn unk(&self) -> Vec<Token<T>> {
        vec![Token::new(self.unk_id, self.unk_token.as_str())]
    }

    /// Tokenize one pre-token.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub fn tokenize(
        &self,
        text: &str,
    ) -> Vec<Token<T>> {
        if text.chars().count() > self.max_input_chars_per_word {
            return self.unk();
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        let mut candidate = String::new();
        while start < text.len() {
            let mut end = text.len();
            let mut found = None;

            while start < end {
                candidate.clear();
                if start > 0 {
                    candidate.push_str(&self.continuing_subword_prefix);
                }
                candidate.push_str(&text[start..end]);

                if let Some(id) = self.vocab.token_to_id(&candidate) {
                    found = Some(Token::new(id, candidate.as_str()));
                    break;
                }
                end -= text[start..end].chars().next_back().map_or(1, char::len_utf8);
            }

            match found {
                Some(token) => pieces.push(token),
                None => return self.unk(),
            }
            start = end;
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> WordPiece<u32> {
        let vocab = TokenVocab::from_pairs([
            ("[UNK]", 100),
            ("ma", 5003),
            ("##ka", 2912),
            ("un", 1),
            ("##aff", 2),
            ("##able", 3),
            ("a", 4),
        ])
        .unwrap();
        WordPiece::new(vocab, "[UNK]", "##", DEFAULT_MAX_INPUT_CHARS_PER_WORD).unwrap()
    }

    fn values(tokens: &[Token<u32>]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_greedy_longest_prefix() {
        let wp = model();
        assert_eq!(values(&wp.tokenize("maka")), vec!["ma", "##ka"]);
        assert_eq!(values(&wp.tokenize("unaffable")), vec!["un", "##aff", "##able"]);
        assert_eq!(
            wp.tokenize("maka").iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![5003, 2912]
        );
    }

    #[test]
    fn test_all_or_nothing_unknown() {
        let wp = model();
        // "unaffablez": the trailing "z" has no piece; the whole word is unknown.
        let tokens = wp.tokenize("unaffablez");
        assert_eq!(values(&tokens), vec!["[UNK]"]);
        assert_eq!(tokens[0].id, 100);
    }

    #[test]
    fn test_max_input_chars() {
        let vocab = TokenVocab::from_pairs([("[UNK]", 0), ("a", 1), ("##a", 2)]).unwrap();
        let wp = WordPiece::<u32>::new(vocab, "[UNK]", "##", 3).unwrap();
        assert_eq!(values(&wp.tokenize("aaa")), vec!["a", "##a", "##a"]);
        assert_eq!(values(&wp.tokenize("aaaa")), vec!["[UNK]"]);
    }

    #[test]
    fn test_unk_must_exist() {
        let vocab = TokenVocab::<u32>::from_pairs([("a", 1)]).unwrap();
        let err = WordPiece::new(vocab, "[UNK]", "##", 100).unwrap_err();
        assert!(matches!(err, TokenizerError::MissingUnkToken(_)));
    }
}
