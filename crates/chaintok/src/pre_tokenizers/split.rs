//! # Split Primitives
//!
//! Every pre-tokenizer is a split of each span into sub-spans: find the
//! matches, label them, then merge or drop them according to a
//! [`SplitBehavior`].

use crate::errors::Result;
use crate::pre_tokenizers::PreToken;
use crate::util::regex::RegexSupplierHandle;
use core::ops::Range;
use serde::{Deserialize, Serialize};

/// What to do with the matched delimiters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitBehavior {
    /// Drop the delimiters.
    Removed,

    /// Keep each delimiter as its own span.
    #[default]
    Isolated,

    /// Append each delimiter to the span before it.
    MergedWithPrevious,

    /// Prepend each delimiter to the span after it.
    MergedWithNext,

    /// Merge runs of consecutive delimiters into one span.
    Contiguous,
}

/// How delimiters are found.
#[derive(Clone, Debug)]
pub enum SplitMatcher {
    /// Regex matches.
    Regex(RegexSupplierHandle),

    /// Every char satisfying the predicate is its own match.
    Char(fn(char) -> bool),

    /// Every occurrence of the char is its own match.
    CharEq(char),
}

impl SplitMatcher {
    /// Label the whole of `text` as alternating gaps (`false`) and matches (`true`).
    pub fn find_matches(
        &self,
        text: &str,
    ) -> Result<Vec<(Range<usize>, bool)>> {
        if text.is_empty() {
            return Ok(vec![(0..0, false)]);
        }

        match self {
            Self::Regex(supplier) => {
                let mut spans = Vec::new();
                let mut prev = 0;
                for m in supplier.get_regex().find_ranges(text)? {
                    if prev != m.start {
                        spans.push((prev..m.start, false));
                    }
                    prev = m.end;
                    spans.push((m, true));
                }
                if prev != text.len() {
                    spans.push((prev..text.len(), false));
                }
                Ok(spans)
            }
            Self::Char(pred) => Ok(char_matches(text, pred)),
            Self::CharEq(d) => Ok(char_matches(text, |c| c == *d)),
        }
    }
}

fn char_matches<F: Fn(char) -> bool>(
    text: &str,
    pred: F,
) -> Vec<(Range<usize>, bool)> {
    let mut spans = Vec::new();
    let mut last = 0;
    for (idx, c) in text.char_indices() {
        if pred(c) {
            if last < idx {
                spans.push((last..idx, false));
            }
            last = idx + c.len_utf8();
            spans.push((idx..last, true));
        }
    }
    if last < text.len() {
        spans.push((last..text.len(), false));
    }
    spans
}

/// Apply `behavior` to labeled matches; returns ranges to keep.
fn apply_behavior(
    matches: Vec<(Range<usize>, bool)>,
    behavior: SplitBehavior,
) -> Vec<Range<usize>> {
    match behavior {
        SplitBehavior::Isolated => matches.into_iter().map(|(r, _)| r).collect(),
        SplitBehavior::Removed => matches
            .into_iter()
            .filter(|(_, is_match)| !is_match)
            .map(|(r, _)| r)
            .collect(),
        SplitBehavior::Contiguous => {
            let mut acc: Vec<Range<usize>> = Vec::new();
            let mut previous = false;
            for (r, is_match) in matches {
                match acc.last_mut() {
                    Some(last) if is_match == previous => last.end = r.end,
                    _ => acc.push(r),
                }
                previous = is_match;
            }
            acc
        }
        SplitBehavior::MergedWithPrevious => {
            let mut acc: Vec<Range<usize>> = Vec::new();
            let mut previous = false;
            for (r, is_match) in matches {
                match acc.last_mut() {
                    Some(last) if is_match && !previous => last.end = r.end,
                    _ => acc.push(r),
                }
                previous = is_match;
            }
            acc
        }
        SplitBehavior::MergedWithNext => {
            let mut acc: Vec<Range<usize>> = Vec::new();
            let mut previous = false;
            for (r, is_match) in matches.into_iter().rev() {
                match acc.last_mut() {
                    Some(last) if is_match && !previous => last.start = r.start,
                    _ => acc.push(r),
                }
                previous = is_match;
            }
            acc.reverse();
            acc
        }
    }
}

/// Split one span; empty results are dropped.
pub fn split_pre_token(
    token: &PreToken,
    matcher: &SplitMatcher,
    behavior: SplitBehavior,
    invert: bool,
) -> Result<Vec<PreToken>> {
    let mut matches = matcher.find_matches(&token.text)?;
    if invert {
        matches.iter_mut().for_each(|(_, m)| *m = !*m);
    }

    Ok(apply_behavior(matches, behavior)
        .into_iter()
        .filter(|r| !r.is_empty())
        .map(|r| PreToken {
            text: token.text[r.clone()].to_string(),
            offset: token.offset + r.start,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::regex::compile_supplier;

    fn split(
        text: &str,
        matcher: &SplitMatcher,
        behavior: SplitBehavior,
        invert: bool,
    ) -> Vec<String> {
        split_pre_token(&PreToken::new(text, 0), matcher, behavior, invert)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_behaviors() {
        let dash = SplitMatcher::CharEq('-');
        let text = "the-final--countdown";

        assert_eq!(
            split(text, &dash, SplitBehavior::Removed, false),
            vec!["the", "final", "countdown"]
        );
        assert_eq!(
            split(text, &dash, SplitBehavior::Isolated, false),
            vec!["the", "-", "final", "-", "-", "countdown"]
        );
        assert_eq!(
            split(text, &dash, SplitBehavior::MergedWithPrevious, false),
            vec!["the-", "final-", "-", "countdown"]
        );
        assert_eq!(
            split(text, &dash, SplitBehavior::MergedWithNext, false),
            vec!["the", "-final", "-", "-countdown"]
        );
        assert_eq!(
            split(text, &dash, SplitBehavior::Contiguous, false),
            vec!["the", "-", "final", "--", "countdown"]
        );
    }

    #[test]
    fn test_regex_invert() {
        let words = SplitMatcher::Regex(compile_supplier(r"\w+|[^\w\s]+").unwrap());
        assert_eq!(
            split("Hey friend!  How are you?!?", &words, SplitBehavior::Removed, true),
            vec!["Hey", "friend", "!", "How", "are", "you", "?!?"]
        );
    }

    #[test]
    fn test_empty_spans_dropped() {
        let dash = SplitMatcher::CharEq('-');
        assert!(split("", &dash, SplitBehavior::Isolated, false).is_empty());
        assert_eq!(split("-a-", &dash, SplitBehavior::Removed, false), vec!["a"]);
    }

    #[test]
    fn test_offsets() {
        let ws = SplitMatcher::Char(char::is_whitespace);
        let token = PreToken::new("ab  cd", 10);
        let parts = split_pre_token(&token, &ws, SplitBehavior::Removed, false).unwrap();
        assert_eq!(parts, vec![PreToken::new("ab", 10), PreToken::new("cd", 14)]);
    }
}
