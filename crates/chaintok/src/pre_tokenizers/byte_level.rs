//! # Byte-Level Pre-Tokenizer

use crate::errors::Result;
use crate::pre_tokenizers::split::{SplitBehavior, SplitMatcher, split_pre_token};
use crate::pre_tokenizers::{PreToken, PreTokenizedString};
use crate::util::regex::{RegexWrapperPattern, compile_supplier};
use crate::vocab::ByteTable;

/// The GPT-2 word split pattern.
pub const GPT2_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// Optional GPT-2 word split, then byte-to-alphabet remap.
#[derive(Clone, Debug)]
pub struct ByteLevel {
    /// Prepend `' '` to each span that does not start with one.
    pub add_prefix_space: bool,

    splitter: Option<SplitMatcher>,
}

impl ByteLevel {
    /// Build the pre-tokenizer; `use_regex` enables the GPT-2 split.
    pub fn new(
        add_prefix_space: bool,
        use_regex: bool,
    ) -> Result<Self> {
        let splitter = if use_regex {
            Some(SplitMatcher::Regex(compile_supplier(
                RegexWrapperPattern::Fancy(GPT2_PATTERN.to_string()),
            )?))
        } else {
            None
        };
        Ok(Self {
            add_prefix_space,
            splitter,
        })
    }

    /// Does this pre-tokenizer split on the GPT-2 pattern?
    pub fn use_regex(&self) -> bool {
        self.splitter.is_some()
    }

    /// Pre-tokenize in place.
    pub fn pre_tokenize(
        &self,
        pts: &mut PreTokenizedString,
    ) -> Result<()> {
        pts.split(|token| {
            let mut token = token.clone();
            if self.add_prefix_space && !token.text.starts_with(' ') {
                token.text.insert(0, ' ');
            }
            match &self.splitter {
                Some(re) => split_pre_token(&token, re, SplitBehavior::Isolated, false),
                None => Ok(vec![token]),
            }
        })?;

        let table = ByteTable::gpt2();
        pts.map(|token| PreToken {
            text: table.encode_str(&token.text),
            offset: token.offset,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        bl: &ByteLevel,
        text: &str,
    ) -> Vec<String> {
        let mut pts = PreTokenizedString::new(text, true);
        bl.pre_tokenize(&mut pts).unwrap();
        pts.texts().into_iter().map(String::from).collect()
    }

    #[test]
    fn test_gpt2_split() {
        let bl = ByteLevel::new(false, true).unwrap();
        assert_eq!(
            run(&bl, "Hello my friend, how is your day going?"),
            vec![
                "Hello", "Ġmy", "Ġfriend", ",", "Ġhow", "Ġis", "Ġyour", "Ġday", "Ġgoing", "?"
            ]
        );
        assert_eq!(run(&bl, "I'm  ok\n"), vec!["I", "'m", "Ġ", "Ġok", "Ċ"]);
    }

    #[test]
    fn test_add_prefix_space() {
        let bl = ByteLevel::new(true, true).unwrap();
        assert_eq!(run(&bl, "Hello"), vec!["ĠHello"]);
        assert_eq!(run(&bl, " Hello"), vec!["ĠHello"]);
    }

    #[test]
    fn test_no_regex() {
        let bl = ByteLevel::new(false, false).unwrap();
        assert!(!bl.use_regex());
        assert_eq!(run(&bl, "a b€"), vec!["aĠbâĤ¬"]);
    }
}
