//! # Token Vocabulary

use crate::errors::{Result, TokenizerError};
use crate::types::{StringToTokenMap, TokenToStringMap, TokenType, token_to_u64};

/// Bidirectional ``{ String <-> T }`` vocabulary.
///
/// Ids are unique; the inverse map is built alongside the forward one.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct TokenVocab<T: TokenType> {
    token_to_id: StringToTokenMap<T>,
    id_to_token: TokenToStringMap<T>,
}

impl<T: TokenType> TokenVocab<T> {
    /// Build a vocabulary from ``(token, id)`` pairs.
    ///
    /// # Errors
    /// If two tokens share an id.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
    {
        let mut vocab = Self::default();
        for (token, id) in pairs {
            vocab.insert(token.into(), id)?;
        }
        vocab.shrink_to_fit();
        Ok(vocab)
    }

    /// Add a ``(token, id)`` pair.
    ///
    /// Re-inserting an identical pair is a no-op.
    ///
    /// # Errors
    /// If the id is already bound to a different token.
    pub fn insert(
        &mut self,
        token: String,
        id: T,
    ) -> Result<()> {
        if let Some(existing) = self.id_to_token.get(&id) {
            if *existing == token {
                return Ok(());
            }
            return Err(TokenizerError::config(
                "model.vocab",
                format!(
                    "id {} is shared by {existing:?} and {token:?}",
                    token_to_u64(id)
                ),
            ));
        }
        if let Some(old) = self.token_to_id.insert(token.clone(), id) {
            self.id_to_token.remove(&old);
        }
        self.id_to_token.insert(id, token);
        Ok(())
    }

    /// The number of distinct ids.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// Returns `true` if the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Look up the id for a token.
    pub fn token_to_id(
        &self,
        token: &str,
    ) -> Option<T> {
        self.token_to_id.get(token).copied()
    }

    /// Look up the token for an id.
    pub fn id_to_token(
        &self,
        id: T,
    ) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    /// Does the vocabulary contain this token?
    pub fn contains(
        &self,
        token: &str,
    ) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// The forward map.
    pub fn token_map(&self) -> &StringToTokenMap<T> {
        &self.token_to_id
    }

    /// Iterate over ``(token, id)`` pairs, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, T)> {
        self.token_to_id.iter().map(|(s, &t)| (s.as_str(), t))
    }

    /// The highest id, if any.
    pub fn max_token(&self) -> Option<T> {
        self.id_to_token.keys().copied().max()
    }

    /// Shrinks the capacity of the underlying maps to fit.
    pub fn shrink_to_fit(&mut self) {
        self.token_to_id.shrink_to_fit();
        self.id_to_token.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_every_entry() {
        let vocab: TokenVocab<u32> =
            TokenVocab::from_pairs([("a", 0), ("b", 1), ("ab", 2), ("▁the", 7)]).unwrap();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.max_token(), Some(7));

        for (token, id) in vocab.iter() {
            assert_eq!(vocab.token_to_id(token), Some(id));
            assert_eq!(vocab.id_to_token(id), Some(token));
        }
        assert_eq!(vocab.token_to_id("zz"), None);
        assert_eq!(vocab.id_to_token(3), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = TokenVocab::<u16>::from_pairs([("a", 0), ("b", 0)]).unwrap_err();
        assert!(matches!(err, TokenizerError::Config { .. }));
    }

    #[test]
    fn test_reinsert_same_pair() {
        let mut vocab = TokenVocab::<u32>::default();
        vocab.insert("x".to_string(), 3).unwrap();
        vocab.insert("x".to_string(), 3).unwrap();
        assert_eq!(vocab.len(), 1);

        vocab.insert("x".to_string(), 4).unwrap();
        assert_eq!(vocab.len(), 1);
        assert_eq!(vocab.token_to_id("x"), Some(4));
        assert_eq!(vocab.id_to_token(3), None);
    }
}
