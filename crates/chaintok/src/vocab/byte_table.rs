//! # Byte/Char Alphabet
//!
//! The GPT-2 byte-level alphabet: every byte maps to a printable char, so
//! arbitrary bytes can live in a string vocabulary.

use ahash::AHashMap;
use core::fmt::Debug;
use std::sync::LazyLock;

static GPT2_BYTE_TABLE: LazyLock<ByteTable> = LazyLock::new(ByteTable::gpt2_alphabet);

/// 0..255 Byte/Char Bijection Table
///
/// Printable Latin-1 bytes map to themselves; the remaining bytes map, in
/// order, to chars from U+0100 upward.
#[derive(Clone, PartialEq)]
pub struct ByteTable {
    /// Table mapping from byte ordinal (position) to char.
    byte_to_char: [char; 256],

    /// Hash map from char to byte ordinal value.
    char_to_byte: AHashMap<char, u8>,
}

impl Debug for ByteTable {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        f.debug_struct("ByteTable")
            .field("chars", &self.byte_to_char.iter().collect::<String>())
            .finish()
    }
}

impl Default for ByteTable {
    fn default() -> Self {
        Self::gpt2().clone()
    }
}

impl ByteTable {
    /// The shared GPT-2 alphabet.
    pub fn gpt2() -> &'static ByteTable {
        &GPT2_BYTE_TABLE
    }

    fn gpt2_alphabet() -> Self {
        let printable = |b: u8| matches!(b, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF);

        let mut byte_to_char = ['\0'; 256];
        let mut shifted = 0u32;
        for b in 0..=255u8 {
            byte_to_char[b as usize] = if printable(b) {
                b as char
            } else {
                let c = char::from_u32(256 + shifted).unwrap_or(char::REPLACEMENT_CHARACTER);
                shifted += 1;
                c
            };
        }

        let char_to_byte = byte_to_char
            .iter()
            .enumerate()
            .map(|(b, &c)| (c, b as u8))
            .collect();

        Self {
            byte_to_char,
            char_to_byte,
        }
    }

    /// Get the char for a byte.
    pub fn get_char(
        &self,
        byte: u8,
    ) -> char {
        self.byte_to_char[byte as usize]
    }

    /// Get the byte for a char, if the char is in the alphabet.
    pub fn get_byte(
        &self,
        c: char,
    ) -> Option<u8> {
        self.char_to_byte.get(&c).copied()
    }

    /// Remap every UTF-8 byte of `text` into the alphabet.
    pub fn encode_str(
        &self,
        text: &str,
    ) -> String {
        text.bytes().map(|b| self.get_char(b)).collect()
    }

    /// Append the bytes of an alphabet string to `buf`.
    ///
    /// Returns `false`, leaving `buf` untouched, if any char is outside the
    /// alphabet.
    pub fn decode_into(
        &self,
        text: &str,
        buf: &mut Vec<u8>,
    ) -> bool {
        let start = buf.len();
        for c in text.chars() {
            match self.get_byte(c) {
                Some(b) => buf.push(b),
                None => {
                    buf.truncate(start);
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpt2_alphabet() {
        let table = ByteTable::gpt2();

        assert_eq!(table.get_char(b'A'), 'A');
        assert_eq!(table.get_char(b' '), 'Ġ');
        assert_eq!(table.get_char(b'\n'), 'Ċ');
        assert_eq!(table.get_char(0), 'Ā');
        assert_eq!(table.get_char(0xAD), 'Ń');

        for b in 0..=255u8 {
            assert_eq!(table.get_byte(table.get_char(b)), Some(b));
        }
        assert_eq!(table.get_byte('中'), None);
    }

    #[test]
    fn test_encode_decode_str() {
        let table = ByteTable::default();
        let encoded = table.encode_str(" héllo");
        assert_eq!(encoded, "ĠhÃ©llo");

        let mut buf = Vec::new();
        assert!(table.decode_into(&encoded, &mut buf));
        assert_eq!(buf, " héllo".as_bytes());

        assert!(!table.decode_into("a中", &mut buf));
        assert_eq!(buf, " héllo".as_bytes());
    }
}
