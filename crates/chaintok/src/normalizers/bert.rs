//! # BERT Normalizer

use crate::util::unicode::{
    is_chinese_char, is_control, is_nonspacing_mark, is_whitespace,
};
use unicode_normalization::UnicodeNormalization;

/// Drop every non-spacing mark after canonical decomposition.
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|&c| !is_nonspacing_mark(c)).collect()
}

/// BERT text cleanup, CJK padding, accent stripping, and lowercasing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BertNormalizer {
    /// Remove control chars and map whitespace to `' '`.
    pub clean_text: bool,

    /// Surround CJK ideographs with spaces.
    pub handle_chinese_chars: bool,

    /// Strip accents.
    pub strip_accents: bool,

    /// Lowercase.
    pub lowercase: bool,
}

impl Default for BertNormalizer {
    fn default() -> Self {
        Self {
            clean_text: true,
            handle_chinese_chars: true,
            strip_accents: true,
            lowercase: true,
        }
    }
}

impl BertNormalizer {
    /// Normalize text.
    pub fn normalize(
        &self,
        text: &str,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if self.clean_text {
                if c == '\0' || c == char::REPLACEMENT_CHARACTER || is_control(c) {
                    continue;
                }
                if is_whitespace(c) {
                    out.push(' ');
                    continue;
                }
            }
            if self.handle_chinese_chars && is_chinese_char(c) {
                out.push(' ');
                out.push(c);
                out.push(' ');
                continue;
            }
            out.push(c);
        }

        if self.strip_accents {
            out = strip_accents(&out);
        }
        if self.lowercase {
            out = out.to_lowercase();
        }
        out
    }
}
