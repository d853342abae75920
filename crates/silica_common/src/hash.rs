//! Content hashing for transformation identities and cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit XXH3 content hash.
///
/// Used as the identity of a syntax tree, of a canonicalized configuration,
/// and of the whole transformation. Equal hashes are assumed to mean equal
/// inputs; the hex [`Display`](fmt::Display) form is the cache key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Returns the raw little-endian hash bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental builder for a [`ContentHash`] over several labelled parts.
///
/// Every part is length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// never collide.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds one length-prefixed part into the hash.
    pub fn update(&mut self, part: &[u8]) -> &mut Self {
        self.state.update(&(part.len() as u64).to_le_bytes());
        self.state.update(part);
        self
    }

    /// Feeds a string part into the hash.
    pub fn update_str(&mut self, part: &str) -> &mut Self {
        self.update(part.as_bytes())
    }

    /// Finishes the hash.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"hello world");
        let b = ContentHash::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"hello");
        let b = ContentHash::from_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_32_hex_chars() {
        let s = ContentHash::from_bytes(b"test").to_string();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hasher_parts_are_length_prefixed() {
        let mut a = ContentHasher::new();
        a.update_str("ab").update_str("c");
        let mut b = ContentHasher::new();
        b.update_str("a").update_str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn hasher_is_deterministic() {
        let run = || {
            let mut h = ContentHasher::new();
            h.update_str("tree").update(&[1, 2, 3]);
            h.finish()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
