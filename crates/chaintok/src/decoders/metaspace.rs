//! # Metaspace Decoder

use crate::pre_tokenizers::PrependScheme;

/// Turn markers back into spaces.
///
/// The first token loses one leading space unless nothing was prepended.
pub fn decode_metaspace(
    tokens: Vec<String>,
    replacement: char,
    prepend_scheme: PrependScheme,
) -> Vec<String> {
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, token)| {
            let token: String = token
                .chars()
                .map(|c| if c == replacement { ' ' } else { c })
                .collect();
            if i == 0 && prepend_scheme != PrependScheme::Never {
                match token.strip_prefix(' ') {
                    Some(rest) => rest.to_string(),
                    None => token,
                }
            } else {
                token
            }
        })
        .collect()
}
