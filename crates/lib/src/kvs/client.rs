//! Remote key-value store contract.
//!
//! [`KvsClient`] abstracts the store API so that the planner and applier can
//! run against the local provider, an in-memory provider in tests, or any
//! other backend exposing the same primitives.

use std::collections::BTreeMap;
use std::future::Future;

use thiserror::Error;
use tracing::{debug, info};

use super::types::{Entry, RemoteSnapshot, VersionToken};

/// Errors returned by remote store and function APIs.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// The named resource does not exist.
  #[error("{kind} not found: {name}")]
  NotFound { kind: &'static str, name: String },

  /// A conditional write presented a stale version token.
  #[error("version conflict on {resource}: If-Match {expected} is stale")]
  Conflict { resource: String, expected: VersionToken },

  /// The remote rejected the request.
  #[error("{operation} rejected: {message}")]
  Rejected { operation: &'static str, message: String },

  /// I/O error talking to the backend.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Backend state could not be decoded or encoded.
  #[error("invalid remote state: {0}")]
  State(#[from] serde_json::Error),
}

impl RemoteError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, RemoteError::NotFound { .. })
  }

  pub fn is_conflict(&self) -> bool {
    matches!(self, RemoteError::Conflict { .. })
  }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// Continuation token for the next page; `None` on the last page.
  pub next: Option<String>,
}

/// Name and identifier of a store, as returned by store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
  pub name: String,
  pub id: String,
}

/// Result of describing a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDescription {
  pub id: String,
  pub version: VersionToken,
  pub item_count: usize,
}

/// Primitives of an edge key-value store API.
pub trait KvsClient: Send + Sync {
  /// List stores visible to the caller, one page at a time.
  fn list_stores(&self, marker: Option<&str>) -> impl Future<Output = Result<Page<StoreSummary>, RemoteError>> + Send;

  /// Describe a store, returning its current version token.
  fn describe_store(&self, store_id: &str) -> impl Future<Output = Result<StoreDescription, RemoteError>> + Send;

  /// List keys and values of a store, one page at a time.
  fn list_keys(
    &self,
    store_id: &str,
    next: Option<&str>,
  ) -> impl Future<Output = Result<Page<Entry>, RemoteError>> + Send;

  /// Apply puts and deletes in one write, conditional on `if_match` being the
  /// store's current version. Returns the new version token.
  fn update_keys(
    &self,
    store_id: &str,
    if_match: &VersionToken,
    puts: &[Entry],
    deletes: &[String],
  ) -> impl Future<Output = Result<VersionToken, RemoteError>> + Send;
}

/// Resolve a store name to its identifier by listing all stores.
pub async fn resolve_store_id<C: KvsClient>(client: &C, name: &str) -> Result<String, RemoteError> {
  let mut marker: Option<String> = None;
  loop {
    let page = client.list_stores(marker.as_deref()).await?;
    if let Some(store) = page.items.into_iter().find(|s| s.name == name) {
      debug!(store = %name, id = %store.id, "resolved store");
      return Ok(store.id);
    }
    match page.next {
      Some(next) => marker = Some(next),
      None => break,
    }
  }

  Err(RemoteError::NotFound {
    kind: "key value store",
    name: name.to_string(),
  })
}

/// Fetch the full contents of a store together with its version token.
///
/// The token is captured before listing, so a write racing with the listing
/// makes the next conditional write fail instead of silently losing it.
pub async fn fetch_snapshot<C: KvsClient>(client: &C, store_id: &str) -> Result<RemoteSnapshot, RemoteError> {
  let description = client.describe_store(store_id).await?;

  let mut values = BTreeMap::new();
  let mut next: Option<String> = None;
  let mut pages = 0usize;
  loop {
    let page = client.list_keys(store_id, next.as_deref()).await?;
    pages += 1;
    for entry in page.items {
      values.insert(entry.key, entry.value);
    }
    match page.next {
      Some(token) => next = Some(token),
      None => break,
    }
  }

  info!(
    store = %store_id,
    keys = values.len(),
    pages,
    version = %description.version,
    "fetched remote snapshot"
  );

  Ok(RemoteSnapshot::new(values, description.version))
}
