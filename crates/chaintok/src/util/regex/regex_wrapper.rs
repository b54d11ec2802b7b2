//! # Regex Wrapper

use crate::errors::{Result, TokenizerError};
use core::fmt::Debug;
use core::ops::Range;
use std::sync::Arc;

/// Common Regex Wrapper Handle Type
pub type RegexWrapperHandle = Arc<RegexWrapper>;

/// Labeled wrapper for regex patterns.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegexWrapperPattern {
    /// A pattern written for the [`regex`] crate.
    Basic(String),

    /// A pattern written for the [`fancy_regex`] crate.
    Fancy(String),

    /// Unknown target; try [`regex`], then fall-up to [`fancy_regex`].
    Adaptive(String),
}

impl From<&str> for RegexWrapperPattern {
    fn from(pattern: &str) -> Self {
        Self::Adaptive(pattern.to_string())
    }
}

impl From<String> for RegexWrapperPattern {
    fn from(pattern: String) -> Self {
        Self::Adaptive(pattern)
    }
}

impl RegexWrapperPattern {
    /// A [`RegexWrapperPattern::Basic`] pattern matching `text` literally.
    pub fn literal<S: AsRef<str>>(text: S) -> Self {
        Self::Basic(regex::escape(text.as_ref()))
    }

    /// Get the underlying pattern string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Basic(p) | Self::Fancy(p) | Self::Adaptive(p) => p,
        }
    }

    /// Compile the pattern.
    pub fn compile(&self) -> Result<RegexWrapper> {
        match self {
            Self::Basic(p) => compile_basic(p),
            Self::Fancy(p) => compile_fancy(p),
            Self::Adaptive(p) => compile_basic(p).or_else(|_| compile_fancy(p)),
        }
    }
}

fn compile_basic(pattern: &str) -> Result<RegexWrapper> {
    regex::Regex::new(pattern)
        .map(RegexWrapper::Basic)
        .map_err(|e| TokenizerError::Regex(format!("{pattern:?}: {e}")))
}

fn compile_fancy(pattern: &str) -> Result<RegexWrapper> {
    fancy_regex::Regex::new(pattern)
        .map(RegexWrapper::Fancy)
        .map_err(|e| TokenizerError::Regex(format!("{pattern:?}: {e}")))
}

/// A compiled regex; either a [`regex::Regex`] or a [`fancy_regex::Regex`].
#[derive(Clone)]
pub enum RegexWrapper {
    /// Compiled with the [`regex`] crate.
    Basic(regex::Regex),

    /// Compiled with the [`fancy_regex`] crate.
    Fancy(fancy_regex::Regex),
}

impl Debug for RegexWrapper {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        match self {
            Self::Basic(_) => write!(f, "RegexWrapper::Basic({:?})", self.as_str()),
            Self::Fancy(_) => write!(f, "RegexWrapper::Fancy({:?})", self.as_str()),
        }
    }
}

impl From<regex::Regex> for RegexWrapper {
    fn from(regex: regex::Regex) -> Self {
        Self::Basic(regex)
    }
}

impl From<fancy_regex::Regex> for RegexWrapper {
    fn from(regex: fancy_regex::Regex) -> Self {
        Self::Fancy(regex)
    }
}

impl RegexWrapper {
    /// Get the source pattern.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Basic(r) => r.as_str(),
            Self::Fancy(r) => r.as_str(),
        }
    }

    /// Is this a [`RegexWrapper::Fancy`] regex?
    pub fn is_fancy(&self) -> bool {
        matches!(self, Self::Fancy(_))
    }

    /// Byte ranges of every non-overlapping match, in order.
    ///
    /// Fancy regexes may fail at match time (backtrack limits); that surfaces
    /// as [`TokenizerError::Regex`].
    pub fn find_ranges(
        &self,
        text: &str,
    ) -> Result<Vec<Range<usize>>> {
        match self {
            Self::Basic(r) => Ok(r.find_iter(text).map(|m| m.range()).collect()),
            Self::Fancy(r) => r
                .find_iter(text)
                .map(|m| {
                    m.map(|m| m.range())
                        .map_err(|e| TokenizerError::Regex(format!("{:?}: {e}", r.as_str())))
                })
                .collect(),
        }
    }

    /// Does the regex match anywhere in `text`?
    pub fn is_match(
        &self,
        text: &str,
    ) -> Result<bool> {
        match self {
            Self::Basic(r) => Ok(r.is_match(text)),
            Self::Fancy(r) => r
                .is_match(text)
                .map_err(|e| TokenizerError::Regex(format!("{:?}: {e}", r.as_str()))),
        }
    }
}
