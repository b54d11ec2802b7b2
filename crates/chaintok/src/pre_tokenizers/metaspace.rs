//! # Metaspace Pre-Tokenizer

use crate::errors::Result;
use crate::pre_tokenizers::split::{SplitBehavior, SplitMatcher, split_pre_token};
use crate::pre_tokenizers::PreTokenizedString;
use serde::{Deserialize, Serialize};

/// The default metaspace marker.
pub const DEFAULT_REPLACEMENT: char = '▁';

/// When to prepend the marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrependScheme {
    /// Only to the span that begins the input.
    First,

    /// Never.
    Never,

    /// To every span.
    #[default]
    Always,
}

impl PrependScheme {
    /// Resolve the legacy `add_prefix_space` flag against an explicit scheme.
    pub fn resolve(
        scheme: Option<PrependScheme>,
        add_prefix_space: Option<bool>,
    ) -> PrependScheme {
        match add_prefix_space {
            Some(false) => PrependScheme::Never,
            _ => scheme.unwrap_or_default(),
        }
    }
}

/// Replace spaces with a visible marker; optionally split before each marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metaspace {
    /// The marker char.
    pub replacement: char,

    /// When to prepend the marker.
    pub prepend_scheme: PrependScheme,

    /// Split so each marker starts a span.
    pub split: bool,
}

impl Default for Metaspace {
    fn default() -> Self {
        Self {
            replacement: DEFAULT_REPLACEMENT,
            prepend_scheme: PrependScheme::Always,
            split: true,
        }
    }
}

impl Metaspace {
    /// Pre-tokenize in place.
    pub fn pre_tokenize(
        &self,
        pts: &mut PreTokenizedString,
    ) -> Result<()> {
        let at_start = pts.at_sequence_start();
        let marker = SplitMatcher::CharEq(self.replacement);

        pts.split(|token| {
            let mut token = token.clone();
            token.text = token.text.replace(' ', self.replacement.encode_utf8(&mut [0; 4]));

            let prepend = match self.prepend_scheme {
                PrependScheme::Always => true,
                PrependScheme::First => at_start && token.offset == 0,
                PrependScheme::Never => false,
            };
            if prepend && !token.text.starts_with(self.replacement) {
                token.text.insert(0, self.replacement);
            }

            if self.split {
                split_pre_token(&token, &marker, SplitBehavior::MergedWithNext, false)
            } else {
                Ok(vec![token])
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        m: &Metaspace,
        text: &str,
        at_start: bool,
    ) -> Vec<String> {
        let mut pts = PreTokenizedString::new(text, at_start);
        m.pre_tokenize(&mut pts).unwrap();
        pts.texts().into_iter().map(String::from).collect()
    }

    #[test]
    fn test_always() {
        let m = Metaspace::default();
        assert_eq!(run(&m, "Hey friend!", true), vec!["▁Hey", "▁friend!"]);
        assert_eq!(run(&m, "Hey  friend", false), vec!["▁Hey", "▁", "▁friend"]);
        assert_eq!(run(&m, " Hey", true), vec!["▁Hey"]);
    }

    #[test]
    fn test_first_only_at_sequence_start() {
        let m = Metaspace {
            prepend_scheme: PrependScheme::First,
            ..Default::default()
        };
        assert_eq!(run(&m, "Hey there", true), vec!["▁Hey", "▁there"]);
        // A span that follows an added token.
        assert_eq!(run(&m, "Hey there", false), vec!["Hey", "▁there"]);
    }

    #[test]
    fn test_never_and_no_split() {
        let m = Metaspace {
            prepend_scheme: PrependScheme::Never,
            split: false,
            ..Default::default()
        };
        assert_eq!(run(&m, "Hey there", true), vec!["Hey▁there"]);
    }

    #[test]
    fn test_resolve_legacy_flag() {
        assert_eq!(PrependScheme::resolve(None, Some(false)), PrependScheme::Never);
        assert_eq!(PrependScheme::resolve(None, Some(true)), PrependScheme::Always);
        assert_eq!(
            PrependScheme::resolve(Some(PrependScheme::First), None),
            PrependScheme::First
        );
    }
}
