//! Edge functions: payload assembly and create/update/publish reconciliation.
//!
//! A function is probed in the development stage. An absent function is
//! created; an existing one is updated conditioned on the described token.
//! Either way the result is then published to live using the newest token.

mod client;
mod payload;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub use client::{FunctionClient, FunctionConfig, FunctionDescription, FunctionStage};
pub use payload::{FunctionKind, FunctionSources, build_function_code, function_config};

use crate::kvs::{RemoteError, VersionToken};
use crate::reconcile::Reconciler;

/// Remote operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOperation {
  Describe,
  Create,
  Update,
  Publish,
}

impl fmt::Display for FunctionOperation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let op = match self {
      FunctionOperation::Describe => "describing",
      FunctionOperation::Create => "creating",
      FunctionOperation::Update => "updating",
      FunctionOperation::Publish => "publishing",
    };
    write!(f, "{}", op)
  }
}

#[derive(Debug, Error)]
#[error("{operation} function {name}: {source}")]
pub struct FunctionError {
  pub operation: FunctionOperation,
  pub name: String,
  #[source]
  pub source: RemoteError,
}

/// Code and configuration a function should end up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
  pub code: Vec<u8>,
  pub config: FunctionConfig,
}

impl FunctionSpec {
  /// Assemble the full payload for `kind`, bound to `store_id`.
  pub fn new(
    kind: FunctionKind,
    name: &str,
    sources: &FunctionSources,
    store_id: &str,
    debug_headers: bool,
  ) -> Self {
    Self {
      code: build_function_code(kind, sources.body(kind), store_id, debug_headers),
      config: function_config(name, store_id),
    }
  }
}

/// Development-stage state of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionState {
  Absent,
  Existing { version: VersionToken },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionAction {
  Create,
  Update { if_match: VersionToken },
}

impl FunctionAction {
  pub fn change(&self) -> FunctionChange {
    match self {
      FunctionAction::Create => FunctionChange::Created,
      FunctionAction::Update { .. } => FunctionChange::Updated,
    }
  }
}

/// What a converge did, or would do, to a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionChange {
  Created,
  Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPlan {
  pub action: FunctionAction,
  pub spec: FunctionSpec,
}

/// Result of a successful converge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
  pub name: String,
  pub change: FunctionChange,
  /// Token returned by the publish call.
  pub version: VersionToken,
}

/// Converges one named edge function.
#[derive(Debug)]
pub struct FunctionReconciler<'a, C> {
  client: &'a C,
  name: String,
}

impl<'a, C: FunctionClient> FunctionReconciler<'a, C> {
  pub fn new(client: &'a C, name: impl Into<String>) -> Self {
    Self {
      client,
      name: name.into(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  fn fail(&self, operation: FunctionOperation) -> impl FnOnce(RemoteError) -> FunctionError + '_ {
    move |source| FunctionError {
      operation,
      name: self.name.clone(),
      source,
    }
  }
}

impl<C: FunctionClient> Reconciler for FunctionReconciler<'_, C> {
  type Desired = FunctionSpec;
  type Observed = FunctionState;
  type Plan = FunctionPlan;
  type Outcome = PublishReport;
  type Error = FunctionError;

  async fn observe(&self) -> Result<FunctionState, FunctionError> {
    match self.client.describe_function(&self.name, FunctionStage::Development).await {
      Ok(desc) => {
        debug!(function = %self.name, version = %desc.version, "function exists");
        Ok(FunctionState::Existing { version: desc.version })
      }
      Err(e) if e.is_not_found() => {
        debug!(function = %self.name, "function does not exist");
        Ok(FunctionState::Absent)
      }
      Err(e) => Err(self.fail(FunctionOperation::Describe)(e)),
    }
  }

  fn diff(&self, desired: &FunctionSpec, observed: &FunctionState) -> FunctionPlan {
    let action = match observed {
      FunctionState::Absent => FunctionAction::Create,
      FunctionState::Existing { version } => FunctionAction::Update {
        if_match: version.clone(),
      },
    };
    FunctionPlan {
      action,
      spec: desired.clone(),
    }
  }

  async fn apply(&self, _observed: FunctionState, plan: FunctionPlan) -> Result<PublishReport, FunctionError> {
    let FunctionPlan { action, spec } = plan;
    let change = action.change();

    let token = match action {
      FunctionAction::Create => {
        info!(function = %self.name, bytes = spec.code.len(), "creating function");
        self
          .client
          .create_function(&self.name, &spec.config, &spec.code)
          .await
          .map_err(self.fail(FunctionOperation::Create))?
      }
      FunctionAction::Update { if_match } => {
        info!(function = %self.name, bytes = spec.code.len(), "updating function");
        self
          .client
          .update_function(&self.name, &if_match, &spec.config, &spec.code)
          .await
          .map_err(self.fail(FunctionOperation::Update))?
      }
    };

    let version = self
      .client
      .publish_function(&self.name, &token)
      .await
      .map_err(self.fail(FunctionOperation::Publish))?;
    info!(function = %self.name, version = %version, "published function");

    Ok(PublishReport {
      name: self.name.clone(),
      change,
      version,
    })
  }
}
