//! Diff computation between a desired dataset and a remote snapshot.

use super::types::{Dataset, RemoteSnapshot, SyncPlan};

/// Compute the writes needed to converge `remote` to `desired`.
///
/// # Put Logic
///
/// Every desired entry whose key is missing remotely, or present with a
/// different value, becomes a put. Puts follow desired-entry order.
///
/// # Delete Logic
///
/// Every remote key absent from `desired` becomes a delete, in remote
/// enumeration order.
///
/// Keys present on both sides with identical values produce nothing, so
/// planning against the result of applying a plan yields an empty plan.
pub fn compute_sync_plan(desired: &Dataset, remote: &RemoteSnapshot) -> SyncPlan {
  let puts = desired
    .iter()
    .filter(|entry| remote.values.get(&entry.key) != Some(&entry.value))
    .cloned()
    .collect();

  let deletes = remote
    .values
    .keys()
    .filter(|key| !desired.contains_key(key))
    .cloned()
    .collect();

  SyncPlan { puts, deletes }
}
