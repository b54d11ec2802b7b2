//! # Precompiled Charmap Normalizer
//!
//! SentencePiece ships its normalization rules as a serialized blob:
//!
//! ```text
//! u32 LE      trie_size (bytes)
//! [u32 LE]    double-array trie units
//! [u8]        NUL-separated replacement strings
//! ```
//!
//! Trie values are offsets into the replacement blob.

use crate::errors::{Result, TokenizerError};
use unicode_segmentation::UnicodeSegmentation;

fn charsmap_error<M: ToString>(message: M) -> TokenizerError {
    TokenizerError::config("normalizer.precompiled_charsmap", message)
}

/// Double-array trie, in the darts-clone layout.
#[derive(Clone, Debug, PartialEq, Eq)]
struct DoubleArray {
    units: Vec<u32>,
}

impl DoubleArray {
    fn has_leaf(unit: u32) -> bool {
        (unit >> 8) & 1 == 1
    }

    fn value(unit: u32) -> usize {
        (unit & ((1 << 31) - 1)) as usize
    }

    fn label(unit: u32) -> u32 {
        unit & ((1 << 31) | 0xFF)
    }

    fn offset(unit: u32) -> usize {
        ((unit >> 10) << ((unit & (1 << 9)) >> 6)) as usize
    }

    /// Values of every key that is a prefix of `key`, shortest first.
    fn common_prefix_search(
        &self,
        key: &[u8],
    ) -> Vec<usize> {
        let mut results = Vec::new();
        let Some(&root) = self.units.first() else {
            return results;
        };

        let mut pos = Self::offset(root);
        for &b in key {
            if b == 0 {
                break;
            }
            pos ^= b as usize;
            let Some(&unit) = self.units.get(pos) else {
                break;
            };
            if Self::label(unit) != b as u32 {
                break;
            }
            pos ^= Self::offset(unit);
            if Self::has_leaf(unit) {
                match self.units.get(pos) {
                    Some(&leaf) => results.push(Self::value(leaf)),
                    None => break,
                }
            }
        }
        results
    }
}

/// Grapheme/char substitution through a precompiled charmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Precompiled {
    trie: DoubleArray,
    normalized: String,
}

impl Precompiled {
    /// Parse a serialized charmap.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (size, rest) = bytes
            .split_first_chunk::<4>()
            .ok_or_else(|| charsmap_error("truncated header"))?;
        let trie_size = u32::from_le_bytes(*size) as usize;

        if trie_size % 4 != 0 || rest.len() < trie_size {
            return Err(charsmap_error(format!(
                "trie size {trie_size} does not fit a {} byte blob",
                bytes.len()
            )));
        }
        let (trie_bytes, normalized) = rest.split_at(trie_size);

        let units = trie_bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let normalized = String::from_utf8(normalized.to_vec()).map_err(charsmap_error)?;

        Ok(Self {
            trie: DoubleArray { units },
            normalized,
        })
    }

    /// Replacement for a chunk, keyed by its shortest matching prefix.
    pub fn transform(
        &self,
        chunk: &str,
    ) -> Option<&str> {
        let start = *self.trie.common_prefix_search(chunk.as_bytes()).first()?;
        let tail = self.normalized.get(start..)?;
        let end = tail.find('\0').unwrap_or(tail.len());
        Some(&tail[..end])
    }

    /// Normalize text; graphemes first, then their individual chars.
    pub fn normalize(
        &self,
        text: &str,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        for grapheme in text.graphemes(true) {
            if grapheme.len() < 6
                && let Some(norm) = self.transform(grapheme)
            {
                out.push_str(norm);
                continue;
            }
            for (idx, c) in grapheme.char_indices() {
                let part = &grapheme[idx..idx + c.len_utf8()];
                out.push_str(self.transform(part).unwrap_or(part));
            }
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A charmap with the single rule `a -> b`.
    pub(crate) fn a_to_b_charmap() -> Vec<u8> {
        let mut units = vec![0u32; 354];
        // Root: children based at offset 256.
        units[0] = 256 << 10;
        // Node for 'a' at 256 ^ 0x61; leaf unit at 353 ^ 352 = 1.
        units[353] = (352 << 10) | (1 << 8) | 0x61;
        units[1] = 1 << 31;

        let mut bytes = ((units.len() * 4) as u32).to_le_bytes().to_vec();
        for unit in units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(b"b\0");
        bytes
    }

    #[test]
    fn test_transform() {
        let p = Precompiled::from_bytes(&a_to_b_charmap()).unwrap();
        assert_eq!(p.transform("a"), Some("b"));
        assert_eq!(p.transform("c"), None);
        assert_eq!(p.normalize("cab a"), "cbb b");
        assert_eq!(p.normalize("é"), "é");
    }

    #[test]
    fn test_rejects_bad_blob() {
        assert!(Precompiled::from_bytes(&[1, 0]).is_err());
        assert!(Precompiled::from_bytes(&[16, 0, 0, 0, 0]).is_err());
    }
}
