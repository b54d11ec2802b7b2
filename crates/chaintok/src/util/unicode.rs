//! # Unicode Character Classes
//!
//! Category tests used by the BERT normalizer, the punctuation
//! pre-tokenizers, and `single_word` added-token matching.

use crate::errors::Result;
use crate::util::regex::{RegexWrapper, RegexWrapperPattern};
use std::sync::LazyLock;

const PUNCTUATION_CLASS: &str = r"\p{P}";
const CONTROL_CLASS: &str = r"[\p{Cc}\p{Cf}\p{Cn}\p{Co}]";
const NONSPACING_MARK_CLASS: &str = r"\p{Mn}";
const WORD_CLASS: &str = r"\w";

/// Single-character class regex; matched against one encoded char.
struct CharClass(RegexWrapper);

impl CharClass {
    fn compile(class: &str) -> Result<Self> {
        RegexWrapperPattern::Basic(format!("^{class}$"))
            .compile()
            .map(Self)
    }

    fn constant(class: &str) -> Self {
        Self::compile(class).expect("CharClass::constant: invalid class")
    }

    fn contains(
        &self,
        c: char,
    ) -> bool {
        let mut buf = [0u8; 4];
        self.0.is_match(c.encode_utf8(&mut buf)).unwrap_or(false)
    }
}

static PUNCTUATION: LazyLock<CharClass> =
    LazyLock::new(|| CharClass::constant(PUNCTUATION_CLASS));

static CONTROL: LazyLock<CharClass> = LazyLock::new(|| CharClass::constant(CONTROL_CLASS));

static NONSPACING_MARK: LazyLock<CharClass> =
    LazyLock::new(|| CharClass::constant(NONSPACING_MARK_CLASS));

static WORD: LazyLock<CharClass> = LazyLock::new(|| CharClass::constant(WORD_CLASS));

/// BERT whitespace: `' '`, `\t`, `\n`, `\r`, and any Unicode white space.
pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r') || c.is_whitespace()
}

/// BERT control characters (`Cc`, `Cf`, `Cn`, `Co`), excluding `\t`, `\n`, `\r`.
pub fn is_control(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        _ => CONTROL.contains(c),
    }
}

/// ASCII punctuation or any Unicode `P*` category character.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || PUNCTUATION.contains(c)
}

/// Unicode non-spacing mark (`Mn`).
pub fn is_nonspacing_mark(c: char) -> bool {
    NONSPACING_MARK.contains(c)
}

/// Regex `\w` word character.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || (!c.is_ascii() && WORD.contains(c))
}

/// CJK Unified Ideograph blocks, as BERT defines them.
pub fn is_chinese_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B920..=0x2CEAF
            | 0xF900..=0xFAFF
            | 0x2F800..=0x2FA1F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes_compile_as_basic() {
        for class in [
            PUNCTUATION_CLASS,
            CONTROL_CLASS,
            NONSPACING_MARK_CLASS,
            WORD_CLASS,
        ] {
            let char_class = CharClass::compile(class).unwrap();
            assert!(!char_class.0.is_fancy(), "{class}");
        }
        assert!(CharClass::compile("[").is_err());
    }

    #[test]
    fn test_punctuation() {
        for c in ['!', '$', '`', '~', '¿', '«', '、', '。'] {
            assert!(is_punctuation(c), "{c:?}");
        }
        for c in ['a', ' ', '1', 'é'] {
            assert!(!is_punctuation(c), "{c:?}");
        }
    }

    #[test]
    fn test_control() {
        assert!(is_control('\u{0}'));
        assert!(is_control('\u{200B}'));
        assert!(!is_control('\t'));
        assert!(!is_control('\n'));
        assert!(!is_control('a'));
    }

    #[test]
    fn test_whitespace() {
        assert!(is_whitespace(' '));
        assert!(is_whitespace('\u{3000}'));
        assert!(!is_whitespace('x'));
    }

    #[test]
    fn test_marks_and_words() {
        assert!(is_nonspacing_mark('\u{0301}'));
        assert!(!is_nonspacing_mark('e'));

        assert!(is_word_char('é'));
        assert!(is_word_char('_'));
        assert!(!is_word_char('-'));
    }

    #[test]
    fn test_chinese_chars() {
        assert!(is_chinese_char('中'));
        assert!(!is_chinese_char('a'));
        assert!(!is_chinese_char('の'));
    }
}
