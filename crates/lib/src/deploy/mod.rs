//! The deploy pipeline.
//!
//! 1. [`build_desired_state`]: scan, parse, merge, resolve chains, validate.
//! 2. Resolve both store names to identifiers.
//! 3. Converge the redirects store, then the headers store.
//! 4. Converge the viewer-request function, then the viewer-response function.
//!
//! Resources are processed strictly one after another and the first failure
//! stops the pipeline; earlier resources keep whatever was applied.

mod desired;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub use desired::{DesiredState, RedirectSources, build_desired_state};

use crate::function::{
  FunctionChange, FunctionClient, FunctionError, FunctionKind, FunctionReconciler, FunctionSources, FunctionSpec,
  PublishReport,
};
use crate::kvs::{
  ApplyReport, Dataset, KvsClient, RemoteError, StoreReconciler, SyncError, SyncPlan, ValidationError, resolve_store_id,
};
use crate::reconcile::{converge, preview};
use crate::redirects::ChainError;
use crate::site::SiteError;

#[derive(Debug, Error)]
pub enum DeployError {
  #[error(transparent)]
  Site(#[from] SiteError),

  #[error("resolving redirect chains: {0}")]
  Chain(#[from] ChainError),

  /// Every size violation across both datasets.
  #[error("validation failed with {} error(s)", .0.len())]
  Validation(Vec<ValidationError>),

  #[error("resolving key value store {store}: {source}")]
  Resolve {
    store: String,
    #[source]
    source: RemoteError,
  },

  #[error(transparent)]
  Sync(#[from] SyncError),

  #[error(transparent)]
  Function(#[from] FunctionError),
}

/// Names of the remote resources a deploy writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployTargets {
  pub redirects_store: String,
  pub headers_store: String,
  pub request_function: String,
  pub response_function: String,
  /// Emit debug headers from the viewer-response function.
  pub debug_headers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReport {
  pub name: String,
  pub id: String,
  #[serde(flatten)]
  pub applied: ApplyReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
  pub redirects: StoreReport,
  pub headers: StoreReport,
  pub request_function: PublishReport,
  pub response_function: PublishReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorePreview {
  pub name: String,
  pub id: String,
  pub plan: SyncPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionPreview {
  pub name: String,
  /// What a deploy would do before publishing.
  pub change: FunctionChange,
}

/// What a deploy would change, computed without writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployPreview {
  pub redirects: StorePreview,
  pub headers: StorePreview,
  pub request_function: FunctionPreview,
  pub response_function: FunctionPreview,
}

struct ResolvedStores {
  redirects: String,
  headers: String,
}

/// Drives a deploy against a store client and a function client.
///
/// Both clients are usually the same provider.
pub struct Deployer<'a, K, F> {
  kvs: &'a K,
  functions: &'a F,
  sources: FunctionSources,
}

impl<'a, K: KvsClient, F: FunctionClient> Deployer<'a, K, F> {
  pub fn new(kvs: &'a K, functions: &'a F, sources: FunctionSources) -> Self {
    Self { kvs, functions, sources }
  }

  async fn resolve(&self, targets: &DeployTargets) -> Result<ResolvedStores, DeployError> {
    let redirects = self.resolve_store(&targets.redirects_store).await?;
    info!(store = %targets.redirects_store, id = %redirects, "resolved redirects store");
    let headers = self.resolve_store(&targets.headers_store).await?;
    info!(store = %targets.headers_store, id = %headers, "resolved headers store");
    Ok(ResolvedStores { redirects, headers })
  }

  async fn resolve_store(&self, store: &str) -> Result<String, DeployError> {
    resolve_store_id(self.kvs, store)
      .await
      .map_err(|source| DeployError::Resolve {
        store: store.to_string(),
        source,
      })
  }

  fn function_spec(&self, kind: FunctionKind, name: &str, store_id: &str, debug_headers: bool) -> FunctionSpec {
    FunctionSpec::new(kind, name, &self.sources, store_id, debug_headers)
  }

  /// Converge both stores and both functions to `desired`.
  pub async fn deploy(&self, desired: &DesiredState, targets: &DeployTargets) -> Result<DeployReport, DeployError> {
    let ids = self.resolve(targets).await?;

    let redirects = self
      .sync_store(&targets.redirects_store, &ids.redirects, &desired.redirects)
      .await?;
    let headers = self
      .sync_store(&targets.headers_store, &ids.headers, &desired.headers)
      .await?;

    let request_spec = self.function_spec(
      FunctionKind::ViewerRequest,
      &targets.request_function,
      &ids.redirects,
      false,
    );
    let request_function = converge(
      &FunctionReconciler::new(self.functions, targets.request_function.as_str()),
      &request_spec,
    )
    .await?;

    let response_spec = self.function_spec(
      FunctionKind::ViewerResponse,
      &targets.response_function,
      &ids.headers,
      targets.debug_headers,
    );
    let response_function = converge(
      &FunctionReconciler::new(self.functions, targets.response_function.as_str()),
      &response_spec,
    )
    .await?;

    info!("deploy complete");
    Ok(DeployReport {
      redirects,
      headers,
      request_function,
      response_function,
    })
  }

  async fn sync_store(&self, name: &str, id: &str, desired: &Dataset) -> Result<StoreReport, DeployError> {
    info!(store = %name, keys = desired.len(), "syncing store");
    let applied = converge(&StoreReconciler::new(self.kvs, name, id), desired).await?;
    info!(
      store = %name,
      puts = applied.puts,
      deletes = applied.deletes,
      batches = applied.batches,
      "store in sync"
    );
    Ok(StoreReport {
      name: name.to_string(),
      id: id.to_string(),
      applied,
    })
  }

  /// Compute what [`Deployer::deploy`] would change, without writing.
  pub async fn preview(&self, desired: &DesiredState, targets: &DeployTargets) -> Result<DeployPreview, DeployError> {
    let ids = self.resolve(targets).await?;

    let redirects = StorePreview {
      name: targets.redirects_store.clone(),
      plan: preview(
        &StoreReconciler::new(self.kvs, targets.redirects_store.as_str(), ids.redirects.as_str()),
        &desired.redirects,
      )
      .await?,
      id: ids.redirects.clone(),
    };
    let headers = StorePreview {
      name: targets.headers_store.clone(),
      plan: preview(
        &StoreReconciler::new(self.kvs, targets.headers_store.as_str(), ids.headers.as_str()),
        &desired.headers,
      )
      .await?,
      id: ids.headers.clone(),
    };

    let request_spec = self.function_spec(
      FunctionKind::ViewerRequest,
      &targets.request_function,
      &ids.redirects,
      false,
    );
    let request_plan = preview(
      &FunctionReconciler::new(self.functions, targets.request_function.as_str()),
      &request_spec,
    )
    .await?;

    let response_spec = self.function_spec(
      FunctionKind::ViewerResponse,
      &targets.response_function,
      &ids.headers,
      targets.debug_headers,
    );
    let response_plan = preview(
      &FunctionReconciler::new(self.functions, targets.response_function.as_str()),
      &response_spec,
    )
    .await?;

    Ok(DeployPreview {
      redirects,
      headers,
      request_function: FunctionPreview {
        name: targets.request_function.clone(),
        change: request_plan.action.change(),
      },
      response_function: FunctionPreview {
        name: targets.response_function.clone(),
        change: response_plan.action.change(),
      },
    })
  }
}
