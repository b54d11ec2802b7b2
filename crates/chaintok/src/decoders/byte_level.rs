//! # Byte-Level Decoder

use crate::vocab::ByteTable;

/// Reverse the byte-to-alphabet remap over all tokens, then decode as UTF-8.
///
/// Invalid UTF-8 becomes U+FFFD. A token with any char outside the alphabet
/// contributes its own UTF-8 bytes.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(tokens)))]
pub fn decode_byte_level(tokens: &[String]) -> String {
    let table = ByteTable::gpt2();
    let mut buf = Vec::with_capacity(tokens.iter().map(String::len).sum());
    for token in tokens {
        if !table.decode_into(token, &mut buf) {
            buf.extend_from_slice(token.as_bytes());
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
