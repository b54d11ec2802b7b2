//! # Replace Normalizer

use crate::errors::Result;
use crate::util::regex::{ConfigPattern, RegexSupplierHandle, compile_supplier};

/// Replace every match of a pattern with fixed content.
#[derive(Clone, Debug)]
pub struct Replace {
    pattern: ConfigPattern,
    content: String,
    regex: RegexSupplierHandle,
}

impl PartialEq for Replace {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.pattern == other.pattern && self.content == other.content
    }
}

impl Replace {
    /// Compile a new replacer.
    pub fn new<S: Into<String>>(
        pattern: ConfigPattern,
        content: S,
    ) -> Result<Self> {
        let regex = compile_supplier(&pattern)?;
        Ok(Self {
            pattern,
            content: content.into(),
            regex,
        })
    }

    /// The configured pattern.
    pub fn pattern(&self) -> &ConfigPattern {
        &self.pattern
    }

    /// Replace every match in `text`.
    pub fn replace(
        &self,
        text: &str,
    ) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for range in self.regex.get_regex().find_ranges(text)? {
            out.push_str(&text[last..range.start]);
            out.push_str(&self.content);
            last = range.end;
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}
