//! Core types for key-value store reconciliation.
//!
//! A [`Dataset`] is the desired contents of one store, a [`RemoteSnapshot`]
//! is the last observed contents of that store, and a [`SyncPlan`] is the
//! minimal set of writes that turns the latter into the former.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single key-value pair destined for an edge key-value store.
///
/// Keys are URL paths (or path patterns such as `*.xml`). Values are either a
/// redirect destination or newline-delimited `Header-Name: value` lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
  pub key: String,
  pub value: String,
}

impl Entry {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      value: value.into(),
    }
  }

  /// Combined byte length of key and value, as counted against store limits.
  pub fn byte_len(&self) -> usize {
    self.key.len() + self.value.len()
  }
}

/// The desired contents of one store.
///
/// Keys are unique. Inserting an existing key replaces its value in place, so
/// iteration order is the order in which each key was first seen.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dataset {
  entries: Vec<Entry>,
  index: HashMap<String, usize>,
}

impl Dataset {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: Vec::with_capacity(capacity),
      index: HashMap::with_capacity(capacity),
    }
  }

  /// Insert an entry, replacing the value of an existing key.
  ///
  /// Returns the previous value if the key was already present.
  pub fn insert(&mut self, entry: Entry) -> Option<String> {
    match self.index.get(&entry.key) {
      Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].value, entry.value)),
      None => {
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
        None
      }
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.index.get(key).map(|&pos| self.entries[pos].value.as_str())
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.index.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn entries(&self) -> &[Entry] {
    &self.entries
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
    self.entries.iter()
  }

  pub fn into_entries(self) -> Vec<Entry> {
    self.entries
  }

  /// Returns a copy with entries ordered by key.
  pub fn sorted(&self) -> Self {
    let mut entries = self.entries.clone();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries.into_iter().collect()
  }
}

impl FromIterator<Entry> for Dataset {
  fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
    let mut data = Dataset::new();
    for entry in iter {
      data.insert(entry);
    }
    data
  }
}

impl Extend<Entry> for Dataset {
  fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
    for entry in iter {
      self.insert(entry);
    }
  }
}

impl<'a> IntoIterator for &'a Dataset {
  type Item = &'a Entry;
  type IntoIter = std::slice::Iter<'a, Entry>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}

/// Opaque optimistic-concurrency token (an ETag) issued by the remote store.
///
/// Every conditional write must present the token from the most recent
/// response; a successful write returns a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(pub String);

impl VersionToken {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for VersionToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Contents of a remote store as observed at one point in time.
///
/// Read-only: once any write succeeds the snapshot is stale and must not be
/// used to condition further writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
  pub values: BTreeMap<String, String>,
  pub version: VersionToken,
}

impl RemoteSnapshot {
  pub fn new(values: BTreeMap<String, String>, version: VersionToken) -> Self {
    Self { values, version }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Writes needed to bring a store to its desired state.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
  /// Entries to create or overwrite, in desired order.
  pub puts: Vec<Entry>,
  /// Keys to remove.
  pub deletes: Vec<String>,
}

impl SyncPlan {
  pub fn is_empty(&self) -> bool {
    self.puts.is_empty() && self.deletes.is_empty()
  }

  /// Total number of items (puts plus deletes).
  pub fn len(&self) -> usize {
    self.puts.len() + self.deletes.len()
  }

  /// Split the plan into batches of at most `max_items` items.
  ///
  /// Each batch is filled with puts first, then topped up with deletes, so
  /// only the batch where puts run out mixes the two.
  pub fn batches(&self, max_items: usize) -> Vec<Batch<'_>> {
    let max_items = max_items.max(1);
    let mut batches = Vec::with_capacity(self.len().div_ceil(max_items));
    let mut put_pos = 0;
    let mut delete_pos = 0;

    while put_pos < self.puts.len() || delete_pos < self.deletes.len() {
      let put_count = (self.puts.len() - put_pos).min(max_items);
      let delete_count = (self.deletes.len() - delete_pos).min(max_items - put_count);

      batches.push(Batch {
        puts: &self.puts[put_pos..put_pos + put_count],
        deletes: &self.deletes[delete_pos..delete_pos + delete_count],
      });

      put_pos += put_count;
      delete_pos += delete_count;
    }

    batches
  }
}

/// One bounded conditional write within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
  pub puts: &'a [Entry],
  pub deletes: &'a [String],
}

impl Batch<'_> {
  pub fn len(&self) -> usize {
    self.puts.len() + self.deletes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.puts.is_empty() && self.deletes.is_empty()
  }
}

/// A single capacity violation found by validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{key}: {message}")]
pub struct ValidationError {
  pub key: String,
  pub message: String,
}

/// Size summary of a dataset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataStats {
  pub num_keys: usize,
  pub total_bytes: usize,
}

impl DataStats {
  /// Share of `capacity` used, in percent.
  pub fn percent_of(&self, capacity: usize) -> f64 {
    if capacity == 0 {
      return 0.0;
    }
    self.total_bytes as f64 / capacity as f64 * 100.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plan_with(puts: usize, deletes: usize) -> SyncPlan {
    SyncPlan {
      puts: (0..puts)
        .map(|i| Entry::new(format!("/page{}", i), format!("/dest{}/", i)))
        .collect(),
      deletes: (0..deletes).map(|i| format!("/old{}", i)).collect(),
    }
  }

  #[test]
  fn dataset_last_write_wins_in_place() {
    let mut data = Dataset::new();
    assert_eq!(data.insert(Entry::new("/a", "/one")), None);
    data.insert(Entry::new("/b", "/two"));
    assert_eq!(data.insert(Entry::new("/a", "/three")), Some("/one".to_string()));

    assert_eq!(data.len(), 2);
    assert_eq!(data.get("/a"), Some("/three"));
    assert_eq!(data.entries()[0].key, "/a");
    assert_eq!(data.entries()[1].key, "/b");
  }

  #[test]
  fn dataset_from_iter_dedupes() {
    let data: Dataset = vec![Entry::new("/x", "1"), Entry::new("/y", "2"), Entry::new("/x", "3")]
      .into_iter()
      .collect();
    assert_eq!(data.len(), 2);
    assert_eq!(data.get("/x"), Some("3"));
    assert!(data.contains_key("/y"));
    assert!(!data.contains_key("/z"));
  }

  #[test]
  fn dataset_sorted_orders_by_key() {
    let data: Dataset = vec![Entry::new("/b", "2"), Entry::new("/a", "1")].into_iter().collect();
    let keys: Vec<_> = data.sorted().iter().map(|e| e.key.clone()).collect();
    assert_eq!(keys, vec!["/a", "/b"]);
  }

  #[test]
  fn empty_plan_has_no_batches() {
    assert!(SyncPlan::default().batches(50).is_empty());
  }

  #[test]
  fn exactly_fifty_items_is_one_batch() {
    let plan = plan_with(50, 0);
    let batches = plan.batches(50);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].puts.len(), 50);
  }

  #[test]
  fn fifty_one_items_is_two_batches() {
    let plan = plan_with(40, 11);
    let batches = plan.batches(50);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 50);
    assert_eq!(batches[1].len(), 1);
    assert_eq!(batches[1].deletes, &["/old10".to_string()]);
  }

  #[test]
  fn mixed_batches_fill_puts_then_deletes() {
    let plan = plan_with(30, 30);
    let batches = plan.batches(50);
    assert_eq!(batches.len(), 2);
    assert_eq!((batches[0].puts.len(), batches[0].deletes.len()), (30, 20));
    assert_eq!((batches[1].puts.len(), batches[1].deletes.len()), (0, 10));
    assert_eq!(batches[1].deletes[0], "/old20");
  }

  #[test]
  fn batches_preserve_input_order() {
    let plan = plan_with(125, 0);
    let batches = plan.batches(50);
    let sizes: Vec<_> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![50, 50, 25]);
    assert_eq!(batches[1].puts[0].key, "/page50");
    assert_eq!(batches[2].puts[24].key, "/page124");
  }

  #[test]
  fn validation_error_display() {
    let err = ValidationError {
      key: "/a".to_string(),
      message: "too big".to_string(),
    };
    assert_eq!(err.to_string(), "/a: too big");
  }

  #[test]
  fn stats_percent() {
    let stats = DataStats {
      num_keys: 1,
      total_bytes: 50,
    };
    assert_eq!(stats.percent_of(200), 25.0);
    assert_eq!(stats.percent_of(0), 0.0);
  }
}
