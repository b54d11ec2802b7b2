//! # BERT and RoBERTa Post-Processing

use crate::encoding::Encoding;
use crate::types::TokenType;

/// `[CLS] A [SEP]` / `[CLS] A [SEP] B [SEP]`, pair type id 1.
#[derive(Clone, Debug, PartialEq)]
pub struct BertProcessor<T: TokenType> {
    /// The separator token.
    pub sep: (String, T),

    /// The classifier token.
    pub cls: (String, T),
}

impl<T: TokenType> BertProcessor<T> {
    /// The number of tokens inserted.
    pub fn added_tokens(
        &self,
        is_pair: bool,
    ) -> usize {
        if is_pair { 3 } else { 2 }
    }

    /// Wrap the inputs.
    pub fn apply(
        &self,
        mut encoding: Encoding<T>,
        pair: Option<Encoding<T>>,
        add_special_tokens: bool,
    ) -> Encoding<T> {
        encoding.set_type_ids(0);
        let pair = pair.map(|mut p| {
            p.set_type_ids(1);
            p
        });
        if !add_special_tokens {
            return Encoding::merge([Some(encoding), pair].into_iter().flatten());
        }

        let mut out = Encoding::with_capacity(encoding.len() + 3);
        out.push(self.cls.1, self.cls.0.as_str(), 0, true);
        out.extend(encoding);
        out.push(self.sep.1, self.sep.0.as_str(), 0, true);
        if let Some(pair) = pair {
            out.extend(pair);
            out.push(self.sep.1, self.sep.0.as_str(), 1, true);
        }
        out
    }
}

/// `<s> A </s>` / `<s> A </s></s> B </s>`, every type id 0.
#[derive(Clone, Debug, PartialEq)]
pub struct RobertaProcessor<T: TokenType> {
    /// The separator token.
    pub sep: (String, T),

    /// The classifier token.
    pub cls: (String, T),

    /// Trim whitespace around token strings.
    pub trim_offsets: bool,

    /// Keep one space on each trimmed side.
    pub add_prefix_space: bool,
}

/// Trim the whitespace around a token.
///
/// With `keep_one` set, one whitespace character survives on each side that
/// had any, and an all-whitespace token collapses to `" "`.
pub fn trim_token(
    token: &str,
    keep_one: bool,
) -> String {
    let trimmed = token.trim();
    if !keep_one {
        return trimmed.to_string();
    }
    if trimmed.is_empty() {
        return if token.is_empty() {
            String::new()
        } else {
            " ".to_string()
        };
    }

    let leading = &token[..token.len() - token.trim_start().len()];
    let trailing = &token[token.trim_end().len()..];

    let mut out = String::with_capacity(trimmed.len() + 2);
    if let Some(c) = leading.chars().last() {
        out.push(c);
    }
    out.push_str(trimmed);
    if let Some(c) = trailing.chars().next() {
        out.push(c);
    }
    out
}

impl<T: TokenType> RobertaProcessor<T> {
    /// The number of tokens inserted.
    pub fn added_tokens(
        &self,
        is_pair: bool,
    ) -> usize {
        if is_pair { 4 } else { 2 }
    }

    fn trim(
        &self,
        encoding: &mut Encoding<T>,
    ) {
        if !self.trim_offsets {
            return;
        }
        for token in encoding.tokens_mut() {
            *token = trim_token(token, self.add_prefix_space);
        }
    }

    /// Trim and wrap the inputs; an empty pair counts as no pair.
    pub fn apply(
        &self,
        mut encoding: Encoding<T>,
        pair: Option<Encoding<T>>,
        add_special_tokens: bool,
    ) -> Encoding<T> {
        let mut pair = pair.filter(|p| !p.is_empty());

        self.trim(&mut encoding);
        encoding.set_type_ids(0);
        if let Some(p) = pair.as_mut() {
            self.trim(p);
            p.set_type_ids(0);
        }
        if !add_special_tokens {
            return Encoding::merge([Some(encoding), pair].into_iter().flatten());
        }

        let mut out = Encoding::with_capacity(encoding.len() + 4);
        out.push(self.cls.1, self.cls.0.as_str(), 0, true);
        out.extend(encoding);
        out.push(self.sep.1, self.sep.0.as_str(), 0, true);
        if let Some(pair) = pair {
            out.push(self.sep.1, self.sep.0.as_str(), 0, true);
            out.extend(pair);
            out.push(self.sep.1, self.sep.0.as_str(), 0, true);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_strs(tokens: &[&str]) -> Encoding<u32> {
        let mut e = Encoding::default();
        for (i, t) in tokens.iter().enumerate() {
            e.push(10 + i as u32, *t, 0, false);
        }
        e
    }

    fn roberta(
        trim_offsets: bool,
        add_prefix_space: bool,
    ) -> RobertaProcessor<u32> {
        RobertaProcessor {
            sep: ("[SEP]".to_string(), 2),
            cls: ("[CLS]".to_string(), 0),
            trim_offsets,
            add_prefix_space,
        }
    }

    #[test]
    fn test_roberta_trims_to_one_space() {
        let input = from_strs(&[" The ", " sun", "sets ", "  in ", "  the    ", "west"]);
        let out = roberta(true, true).apply(input, None, true);
        assert_eq!(
            out.tokens(),
            &["[CLS]", " The ", " sun", "sets ", " in ", " the ", "west", "[SEP]"]
        );
    }

    #[test]
    fn test_roberta_trim_modes() {
        let input = from_strs(&["  in ", "   "]);

        let full = roberta(true, false).apply(input.clone(), None, false);
        assert_eq!(full.tokens(), &["in", ""]);

        let untouched = roberta(false, true).apply(input.clone(), None, false);
        assert_eq!(untouched.tokens(), input.tokens());

        let kept = roberta(true, true).apply(input, None, false);
        assert_eq!(kept.tokens(), &[" in ", " "]);
    }

    #[test]
    fn test_roberta_pair_layout() {
        let processor = roberta(false, true);
        let mut b = from_strs(&["b"]);
        b.set_type_ids(1);

        let out = processor.apply(from_strs(&["a"]), Some(b), true);
        assert_eq!(out.tokens(), &["[CLS]", "a", "[SEP]", "[SEP]", "b", "[SEP]"]);
        assert_eq!(out.type_ids(), &[0; 6]);
        assert_eq!(processor.added_tokens(true), 4);

        let empty_pair = processor.apply(from_strs(&["a"]), Some(Encoding::default()), true);
        assert_eq!(empty_pair.tokens(), &["[CLS]", "a", "[SEP]"]);
    }

    #[test]
    fn test_bert_layout() {
        let processor = BertProcessor {
            sep: ("[SEP]".to_string(), 102),
            cls: ("[CLS]".to_string(), 101),
        };
        let out = processor.apply(from_strs(&["a"]), Some(from_strs(&["b"])), true);
        assert_eq!(out.ids(), &[101, 10, 102, 10, 102]);
        assert_eq!(out.type_ids(), &[0, 0, 0, 1, 1]);
        assert_eq!(out.special_tokens_mask(), &[1, 0, 1, 0, 1]);

        let bare = processor.apply(from_strs(&["a"]), Some(from_strs(&["b"])), false);
        assert_eq!(bare.type_ids(), &[0, 1]);
    }
}
