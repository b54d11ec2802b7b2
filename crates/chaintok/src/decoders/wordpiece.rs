//! # WordPiece Decoder

/// Join WordPiece tokens, gluing continuation pieces onto the previous piece.
pub fn decode_wordpiece(
    tokens: Vec<String>,
    prefix: &str,
    cleanup: bool,
) -> Vec<String> {
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, token)| {
            let token = if i == 0 {
                token
            } else if let Some(rest) = token.strip_prefix(prefix) {
                rest.to_string()
            } else {
                format!(" {token}")
            };
            if cleanup {
                cleanup_wordpiece(&token)
            } else {
                token
            }
        })
        .collect()
}

const CLEANUP_RULES: &[(&str, &str)] = &[
    (" .", "."),
    (" ?", "?"),
    (" !", "!"),
    (" ,", ","),
    (" ' ", "'"),
    (" n't", "n't"),
    (" 'm", "'m"),
    (" 's", "'s"),
    (" 've", "'ve"),
    (" 're", "'re"),
];

fn apply_rules<'a, I>(
    text: &str,
    rules: I,
) -> String
where
    I: IntoIterator<Item = &'a (&'a str, &'a str)>,
{
    rules
        .into_iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Remove spaces before punctuation and contractions.
pub fn cleanup_tokenization_spaces(text: &str) -> String {
    apply_rules(text, CLEANUP_RULES)
}

fn cleanup_wordpiece(text: &str) -> String {
    // Same table, with " do not" -> " don't" ahead of " 's".
    let (head, tail) = CLEANUP_RULES.split_at(7);
    apply_rules(text, head.iter().chain(&[(" do not", " don't")]).chain(tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_join() {
        let out = decode_wordpiece(strs(&["ma", "##ka", "is", "##"]), "##", false);
        assert_eq!(out.concat(), "maka is");
    }

    #[test]
    fn test_strips_prefix_once() {
        let out = decode_wordpiece(strs(&["a", "####b"]), "##", false);
        assert_eq!(out.concat(), "a##b");
    }

    #[test]
    fn test_cleanup() {
        let tokens = strs(&[
            "hello", ",", "i", "'", "m", "here", "!", "i", "do", "not", "know", ".",
        ]);
        // Cleanup runs per token, so rules spanning two tokens do not fire.
        let out = decode_wordpiece(tokens.clone(), "##", true).concat();
        assert_eq!(out, "hello, i ' m here! i do not know.");

        let raw = decode_wordpiece(tokens, "##", false).concat();
        assert_eq!(raw, "hello , i ' m here ! i do not know .");
        assert_eq!(cleanup_tokenization_spaces(&raw), "hello, i'm here! i do not know.");

        assert_eq!(cleanup_wordpiece("i do not"), "i don't");
        assert_eq!(
            cleanup_tokenization_spaces("it 's fine , isn 't it ?"),
            "it's fine, isn 't it?"
        );
    }
}
