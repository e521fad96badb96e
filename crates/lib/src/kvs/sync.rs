//! Store-level reconciliation: snapshot, plan, batched apply.

use thiserror::Error;

use crate::reconcile::Reconciler;

use super::apply::{ApplyError, ApplyReport, apply_plan};
use super::client::{KvsClient, RemoteError, fetch_snapshot};
use super::plan::compute_sync_plan;
use super::types::{Dataset, RemoteSnapshot, SyncPlan};

/// Errors converging one store.
#[derive(Debug, Error)]
pub enum SyncError {
  /// Reading the store's current contents failed.
  #[error("fetching existing keys of store {store}: {source}")]
  Fetch {
    store: String,
    #[source]
    source: RemoteError,
  },

  /// A conditional write failed part way through the plan.
  #[error("updating store {store}: {source}")]
  Apply {
    store: String,
    #[source]
    source: ApplyError,
  },
}

/// Converges one key-value store, identified by its resolved id.
#[derive(Debug)]
pub struct StoreReconciler<'a, C> {
  client: &'a C,
  name: String,
  store_id: String,
}

impl<'a, C: KvsClient> StoreReconciler<'a, C> {
  pub fn new(client: &'a C, name: impl Into<String>, store_id: impl Into<String>) -> Self {
    Self {
      client,
      name: name.into(),
      store_id: store_id.into(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn store_id(&self) -> &str {
    &self.store_id
  }
}

impl<C: KvsClient> Reconciler for StoreReconciler<'_, C> {
  type Desired = Dataset;
  type Observed = RemoteSnapshot;
  type Plan = SyncPlan;
  type Outcome = ApplyReport;
  type Error = SyncError;

  async fn observe(&self) -> Result<RemoteSnapshot, SyncError> {
    fetch_snapshot(self.client, &self.store_id)
      .await
      .map_err(|source| SyncError::Fetch {
        store: self.name.clone(),
        source,
      })
  }

  fn diff(&self, desired: &Dataset, observed: &RemoteSnapshot) -> SyncPlan {
    compute_sync_plan(desired, observed)
  }

  async fn apply(&self, observed: RemoteSnapshot, plan: SyncPlan) -> Result<ApplyReport, SyncError> {
    apply_plan(self.client, &self.store_id, observed.version, plan)
      .await
      .map_err(|source| SyncError::Apply {
        store: self.name.clone(),
        source,
      })
  }
}
