//! Batched, conditional application of a sync plan.
//!
//! The store accepts at most [`MAX_KEYS_PER_BATCH`] puts plus deletes per
//! write, and every write is conditioned on the version token returned by the
//! previous one. Larger plans are therefore split into batches that run
//! strictly one after another.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::MAX_KEYS_PER_BATCH;

use super::client::{KvsClient, RemoteError};
use super::types::{SyncPlan, VersionToken};

/// Outcome of applying a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
  /// Number of conditional writes issued.
  pub batches: usize,
  pub puts: usize,
  pub deletes: usize,
  /// Version token after the last write (unchanged for an empty plan).
  pub version: VersionToken,
}

/// A batch of an apply failed.
///
/// Batches before `batch_index` were applied and are not rolled back.
#[derive(Debug, Error)]
#[error(
  "batch {}/{} failed after {} put(s) and {} delete(s) attempted: {source}",
  .batch_index + 1,
  .total_batches,
  .puts_attempted,
  .deletes_attempted
)]
pub struct ApplyError {
  /// Zero-based index of the failing batch.
  pub batch_index: usize,
  pub total_batches: usize,
  /// Puts sent so far, including the failing batch.
  pub puts_attempted: usize,
  /// Deletes sent so far, including the failing batch.
  pub deletes_attempted: usize,
  #[source]
  pub source: RemoteError,
}

impl ApplyError {
  /// Whether the failure was a stale version token.
  pub fn is_conflict(&self) -> bool {
    self.source.is_conflict()
  }
}

/// Apply `plan` to a store, starting from `version`.
///
/// An empty plan returns immediately without touching the remote. Otherwise
/// each batch is written with the token returned by the previous batch; the
/// first failure aborts the remaining batches.
pub async fn apply_plan<C: KvsClient>(
  client: &C,
  store_id: &str,
  version: VersionToken,
  plan: SyncPlan,
) -> Result<ApplyReport, ApplyError> {
  apply_plan_in_batches(client, store_id, version, plan, MAX_KEYS_PER_BATCH).await
}

pub(crate) async fn apply_plan_in_batches<C: KvsClient>(
  client: &C,
  store_id: &str,
  version: VersionToken,
  plan: SyncPlan,
  max_items: usize,
) -> Result<ApplyReport, ApplyError> {
  if plan.is_empty() {
    debug!(store = %store_id, "plan is empty, skipping write");
    return Ok(ApplyReport {
      batches: 0,
      puts: 0,
      deletes: 0,
      version,
    });
  }

  let batches = plan.batches(max_items);
  let total_batches = batches.len();
  let mut version = version;
  let mut puts = 0usize;
  let mut deletes = 0usize;

  for (batch_index, batch) in batches.into_iter().enumerate() {
    puts += batch.puts.len();
    deletes += batch.deletes.len();

    debug!(
      store = %store_id,
      batch = batch_index + 1,
      total = total_batches,
      puts = batch.puts.len(),
      deletes = batch.deletes.len(),
      if_match = %version,
      "writing batch"
    );

    version = client
      .update_keys(store_id, &version, batch.puts, batch.deletes)
      .await
      .map_err(|source| ApplyError {
        batch_index,
        total_batches,
        puts_attempted: puts,
        deletes_attempted: deletes,
        source,
      })?;
  }

  info!(
    store = %store_id,
    batches = total_batches,
    puts,
    deletes,
    version = %version,
    "applied plan"
  );

  Ok(ApplyReport {
    batches: total_batches,
    puts,
    deletes,
    version,
  })
}
