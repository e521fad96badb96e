//! Remote edge-function contract.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::kvs::{RemoteError, VersionToken};

/// Stage of an edge function.
///
/// Creates and updates land in `Development`; publishing copies the
/// development code to `Live`, where it serves traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionStage {
  Development,
  Live,
}

impl FunctionStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      FunctionStage::Development => "DEVELOPMENT",
      FunctionStage::Live => "LIVE",
    }
  }
}

impl fmt::Display for FunctionStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Configuration attached to a function on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FunctionConfig {
  pub comment: String,
  pub runtime: String,
  /// Identifiers of the key-value stores the function may read.
  pub key_value_store_ids: Vec<String>,
}

/// Result of describing a function in one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescription {
  pub name: String,
  pub stage: FunctionStage,
  pub version: VersionToken,
}

/// Primitives of an edge-function hosting API.
pub trait FunctionClient: Send + Sync {
  /// Describe a function in `stage`. A missing function is
  /// [`RemoteError::NotFound`].
  fn describe_function(
    &self,
    name: &str,
    stage: FunctionStage,
  ) -> impl Future<Output = Result<FunctionDescription, RemoteError>> + Send;

  /// Create a function in the development stage.
  fn create_function(
    &self,
    name: &str,
    config: &FunctionConfig,
    code: &[u8],
  ) -> impl Future<Output = Result<VersionToken, RemoteError>> + Send;

  /// Replace a function's development code and configuration, conditional on
  /// `if_match`.
  fn update_function(
    &self,
    name: &str,
    if_match: &VersionToken,
    config: &FunctionConfig,
    code: &[u8],
  ) -> impl Future<Output = Result<VersionToken, RemoteError>> + Send;

  /// Promote the development stage to live, conditional on `if_match`.
  fn publish_function(
    &self,
    name: &str,
    if_match: &VersionToken,
  ) -> impl Future<Output = Result<VersionToken, RemoteError>> + Send;
}
