//! # Regex Supplier Trait

use crate::util::regex::RegexWrapper;
use std::sync::Arc;

/// Common Regex Supplier Handle Type
pub type RegexSupplierHandle = Arc<dyn RegexSupplier>;

/// Regex Supplier Trait
pub trait RegexSupplier: Sync + Send {
    /// Get the regex.
    fn get_regex(&self) -> Arc<RegexWrapper>;

    /// Get the regex pattern.
    fn get_pattern(&self) -> String {
        self.get_regex().as_str().to_string()
    }
}

impl core::fmt::Debug for dyn RegexSupplier {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        write!(f, "RegexSupplier({:?})", self.get_pattern())
    }
}

impl RegexSupplier for Arc<RegexWrapper> {
    fn get_regex(&self) -> Arc<RegexWrapper> {
        self.clone()
    }
}
