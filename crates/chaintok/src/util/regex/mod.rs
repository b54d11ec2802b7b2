//! # Regex Utilities
//!
//! Tokenizer configs carry patterns written for two different engines; the
//! GPT-2 split pattern, for example, uses a lookahead the [`regex`] crate
//! cannot compile. Patterns are labeled with [`RegexWrapperPattern`]:
//!
//! * [`RegexWrapperPattern::Basic`] - a pattern which was written for [`regex`].
//! * [`RegexWrapperPattern::Fancy`] - a pattern which was written for [`fancy_regex`].
//! * [`RegexWrapperPattern::Adaptive`] - unknown target, try basic; then fall-up to fancy.
//!
//! Compiled regexes are shared through a [`RegexSupplier`]. Under heavy
//! parallel encode load, compiled regexes fight over internal scratch
//! buffers; [`parallel_regex_supplier`] hands each thread slot its own clone.

mod regex_pool;
mod regex_supplier;
mod regex_wrapper;

pub use regex_pool::RegexWrapperPool;
pub use regex_supplier::{RegexSupplier, RegexSupplierHandle};
pub use regex_wrapper::{RegexWrapper, RegexWrapperHandle, RegexWrapperPattern};

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A pattern as written in tokenizer configs: `{"String": ..}` or `{"Regex": ..}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigPattern {
    /// Match the string literally.
    String(String),

    /// Match a regular expression.
    Regex(String),
}

impl From<&ConfigPattern> for RegexWrapperPattern {
    fn from(pattern: &ConfigPattern) -> Self {
        match pattern {
            ConfigPattern::String(s) => RegexWrapperPattern::literal(s),
            ConfigPattern::Regex(r) => RegexWrapperPattern::Adaptive(r.clone()),
        }
    }
}

/// Build a regex supplier for (potentially) parallel execution.
///
/// With the `rayon` feature this is a [`RegexWrapperPool`]; otherwise the
/// compiled regex is shared directly.
pub fn parallel_regex_supplier<R>(regex: R) -> RegexSupplierHandle
where
    R: Into<RegexWrapperHandle>,
{
    let regex = regex.into();

    #[cfg(feature = "rayon")]
    return Arc::new(RegexWrapperPool::new(regex));

    #[cfg(not(feature = "rayon"))]
    return Arc::new(regex);
}

/// Compile a pattern and wrap it in a [`parallel_regex_supplier`].
pub fn compile_supplier<P>(pattern: P) -> Result<RegexSupplierHandle>
where
    P: Into<RegexWrapperPattern>,
{
    Ok(parallel_regex_supplier(Arc::new(pattern.into().compile()?)))
}
