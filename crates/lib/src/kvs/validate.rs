//! Capacity validation for datasets.
//!
//! Limits are inclusive ceilings: a key of exactly [`MAX_KEY_BYTES`] bytes is
//! valid, one byte more is not. Validation collects every violation instead of
//! stopping at the first so they can be reported together.

use crate::consts::{MAX_ENTRY_BYTES, MAX_KEY_BYTES, MAX_TOTAL_BYTES, TOTAL_KEY};

use super::types::{DataStats, Dataset, ValidationError};

/// Check a dataset against the store's size constraints.
///
/// An entry can produce both a key-size and an entry-size error. A total-size
/// violation is reported once, keyed by [`TOTAL_KEY`].
pub fn validate(data: &Dataset) -> Vec<ValidationError> {
  let mut errors = Vec::new();
  let mut total = 0usize;

  for entry in data {
    let key_size = entry.key.len();
    let entry_size = entry.byte_len();

    if key_size > MAX_KEY_BYTES {
      errors.push(ValidationError {
        key: entry.key.clone(),
        message: format!("key exceeds {} bytes ({} bytes)", MAX_KEY_BYTES, key_size),
      });
    }

    if entry_size > MAX_ENTRY_BYTES {
      errors.push(ValidationError {
        key: entry.key.clone(),
        message: format!("key+value exceeds {} bytes ({} bytes)", MAX_ENTRY_BYTES, entry_size),
      });
    }

    total += entry_size;
  }

  if total > MAX_TOTAL_BYTES {
    errors.push(ValidationError {
      key: TOTAL_KEY.to_string(),
      message: format!("total data exceeds {} bytes ({} bytes)", MAX_TOTAL_BYTES, total),
    });
  }

  errors
}

/// Number of keys and total key+value bytes in a dataset.
pub fn stats(data: &Dataset) -> DataStats {
  DataStats {
    num_keys: data.len(),
    total_bytes: data.iter().map(|e| e.byte_len()).sum(),
  }
}
