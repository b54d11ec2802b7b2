//! # Byte-Fallback Decoder

/// Parse a `<0xNN>` byte token.
pub fn parse_byte_token(token: &str) -> Option<u8> {
    let hex = token.strip_prefix("<0x")?.strip_suffix('>')?;
    if hex.len() != 2 {
        return None;
    }
    u8::from_str_radix(hex, 16).ok()
}

fn flush(
    bytes: &mut Vec<u8>,
    out: &mut Vec<String>,
) {
    if bytes.is_empty() {
        return;
    }
    match String::from_utf8(std::mem::take(bytes)) {
        Ok(s) => out.push(s),
        Err(err) => {
            let n = err.as_bytes().len();
            out.extend(std::iter::repeat_n("\u{FFFD}".to_string(), n));
        }
    }
}

/// Fold runs of `<0xNN>` tokens into the text they encode.
///
/// A run that is not valid UTF-8 becomes one U+FFFD per byte.
pub fn decode_byte_fallback(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut bytes = Vec::new();
    for token in tokens {
        match parse_byte_token(&token) {
            Some(b) => bytes.push(b),
            None => {
                flush(&mut bytes, &mut out);
                out.push(token);
            }
        }
    }
    flush(&mut bytes, &mut out);
    out
}
