//! Edge key-value store reconciliation.
//!
//! The flow for one store is: [`fetch_snapshot`] observes the remote,
//! [`compute_sync_plan`] diffs it against the desired [`Dataset`], and
//! [`apply_plan`] converges the remote through batched conditional writes.

pub mod apply;
pub mod client;
pub mod plan;
pub mod sync;
pub mod types;
pub mod validate;

pub use apply::{ApplyError, ApplyReport, apply_plan};
pub use client::{KvsClient, Page, RemoteError, StoreDescription, StoreSummary, fetch_snapshot, resolve_store_id};
pub use plan::compute_sync_plan;
pub use sync::{StoreReconciler, SyncError};
pub use types::{Batch, DataStats, Dataset, Entry, RemoteSnapshot, SyncPlan, ValidationError, VersionToken};
pub use validate::{stats, validate};
