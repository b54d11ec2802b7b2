//! # Common Types and Traits
use crate::errors::{Result, TokenizerError};
use core::hash::Hash;
use num_traits::{FromPrimitive, ToPrimitive, Unsigned};
use std::fmt::Debug;

/// A type that can be used as a token id.
pub trait TokenType:
    'static
    + Default
    + Debug
    + Clone
    + Copy
    + Hash
    + Send
    + Sync
    + Unsigned
    + FromPrimitive
    + ToPrimitive
    + Ord
    + serde::Serialize
    + for<'de> serde::Deserialize<'de>
{
}

impl<T> TokenType for T where
    T: 'static
        + Default
        + Debug
        + Clone
        + Copy
        + Hash
        + Send
        + Sync
        + Unsigned
        + FromPrimitive
        + ToPrimitive
        + Ord
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>
{
}

/// Convert a raw `u64` id into a token, failing if it is out of range.
pub fn try_token_from_u64<T: TokenType>(id: u64) -> Result<T> {
    T::from_u64(id).ok_or(TokenizerError::TokenOutOfRange(id))
}

/// Convert a `usize` index into a token, failing if it is out of range.
pub fn try_token_from_usize<T: TokenType>(id: usize) -> Result<T> {
    T::from_usize(id).ok_or(TokenizerError::TokenOutOfRange(id as u64))
}

/// Widen a token into a `u64`.
pub fn token_to_u64<T: TokenType>(token: T) -> u64 {
    // Every `Unsigned + ToPrimitive` token type we accept fits.
    token.to_u64().unwrap_or(u64::MAX)
}

/// A pair of tokens.
pub type Pair<T> = (T, T);

/// Merge rank; lower merges first.
pub type Rank = u32;

/// [`Pair<T>`] to `(rank, merged token)` map.
pub type PairRankMap<T> = ahash::AHashMap<Pair<T>, (Rank, T)>;

/// String to T map.
pub type StringToTokenMap<T> = ahash::AHashMap<String, T>;

/// T to string map.
pub type TokenToStringMap<T> = ahash::AHashMap<T, String>;

/// Check if a type is `Send`.
#[cfg(test)]
pub(crate) fn check_is_send<S: Send>(_: S) {}

#[cfg(test)]
/// Check if a type is `Sync`.
pub(crate) fn check_is_sync<S: Sync>(_: S) {}
