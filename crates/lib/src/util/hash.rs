//! Hashing helpers for generated identifiers and version tokens.

use sha2::{Digest, Sha256};

use crate::consts::TOKEN_PREFIX_LEN;

/// A full 64-character SHA-256 hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
  /// The first [`TOKEN_PREFIX_LEN`] characters.
  pub fn short(&self) -> &str {
    &self.0[..TOKEN_PREFIX_LEN.min(self.0.len())]
  }
}

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}

/// Hash several byte strings as one, with each part length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn hash_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> ContentHash {
  let mut hasher = Sha256::new();
  for part in parts {
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part);
  }
  ContentHash(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_bytes_known_value() {
    assert_eq!(
      hash_bytes(b"hello world").0,
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
  }

  #[test]
  fn short_is_prefix() {
    let hash = hash_bytes(b"x");
    assert_eq!(hash.short().len(), TOKEN_PREFIX_LEN);
    assert!(hash.0.starts_with(hash.short()));
  }

  #[test]
  fn parts_are_length_prefixed() {
    let a = hash_parts([b"ab".as_slice(), b"c".as_slice()]);
    let b = hash_parts([b"a".as_slice(), b"bc".as_slice()]);
    assert_ne!(a, b);
  }
}
