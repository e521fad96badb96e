//! Redirect dataset construction.
//!
//! Redirects come from two sources: directory-implied redirects (`/dir` to
//! `/dir/`) and explicit declarations. [`merge_redirects`] combines them with
//! explicit declarations taking precedence, and [`resolve_chains`] collapses
//! multi-hop chains so that every key points at its final destination and the
//! edge function never has to follow more than one hop.

pub mod declarations;

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::kvs::{Dataset, Entry};

pub use declarations::{ParsedRedirects, SkippedLine, parse_declarations};

/// Errors from redirect chain resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
  /// Following the chain from `start` revisited `revisited`.
  #[error("redirect cycle detected starting at {start} (revisits {revisited})")]
  Cycle { start: String, revisited: String },
}

/// Union of two redirect datasets; on key collision `high` wins.
///
/// Keys keep the position at which they first appear, low-priority keys first.
pub fn merge_redirects(low: &Dataset, high: &Dataset) -> Dataset {
  let mut merged = Dataset::with_capacity(low.len() + high.len());
  merged.extend(low.iter().cloned());
  merged.extend(high.iter().cloned());
  merged
}

/// Replace every redirect destination with the end of its chain.
///
/// For each entry the destination is looked up as a key repeatedly until a
/// destination that is not itself a key is reached. Each start key is
/// resolved against the unmodified input, so resolution order does not
/// matter. Revisiting a key while following one chain is a cycle.
pub fn resolve_chains(entries: &Dataset) -> Result<Dataset, ChainError> {
  let mut resolved = Dataset::with_capacity(entries.len());
  let mut collapsed = 0usize;

  for entry in entries {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(entry.key.as_str());

    let mut destination = entry.value.as_str();
    while let Some(next) = entries.get(destination) {
      if !visited.insert(destination) {
        return Err(ChainError::Cycle {
          start: entry.key.clone(),
          revisited: destination.to_string(),
        });
      }
      destination = next;
    }

    if destination != entry.value {
      collapsed += 1;
    }
    resolved.insert(Entry::new(entry.key.clone(), destination));
  }

  debug!(entries = resolved.len(), collapsed, "resolved redirect chains");
  Ok(resolved)
}
