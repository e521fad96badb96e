//! Desired-state computation shared by dry runs, diffs and deploys.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::kvs::{DataStats, Dataset, ValidationError, stats, validate};
use crate::redirects::{SkippedLine, merge_redirects, resolve_chains};
use crate::site::{read_headers, read_redirects, scan_directories};

use super::DeployError;

/// Per-source counts gathered while building the redirect dataset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RedirectSources {
  pub directories: usize,
  pub declared: usize,
  pub merged: usize,
}

/// Validated contents for both stores.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredState {
  /// Chain-resolved redirects.
  pub redirects: Dataset,
  pub headers: Dataset,
  pub sources: RedirectSources,
  /// Malformed redirect declarations that were ignored.
  pub skipped: Vec<SkippedLine>,
  pub redirect_stats: DataStats,
  pub header_stats: DataStats,
}

/// Read the site output, build both datasets and validate them.
///
/// Validation covers both datasets before failing, so
/// [`DeployError::Validation`] lists every violation at once.
pub fn build_desired_state(output_dir: &Path) -> Result<DesiredState, DeployError> {
  info!(dir = %output_dir.display(), "scanning site output");
  let directories = scan_directories(output_dir)?;
  let declared = read_redirects(output_dir)?;

  let merged = merge_redirects(&directories, &declared.entries);
  let sources = RedirectSources {
    directories: directories.len(),
    declared: declared.entries.len(),
    merged: merged.len(),
  };
  info!(
    directories = sources.directories,
    declared = sources.declared,
    merged = sources.merged,
    "merged redirects"
  );

  let redirects = resolve_chains(&merged)?;
  let headers = read_headers(output_dir)?;

  let mut errors: Vec<ValidationError> = validate(&redirects);
  errors.extend(validate(&headers));
  if !errors.is_empty() {
    return Err(DeployError::Validation(errors));
  }

  let redirect_stats = stats(&redirects);
  let header_stats = stats(&headers);
  info!(
    redirects = redirect_stats.num_keys,
    headers = header_stats.num_keys,
    "validation passed"
  );

  Ok(DesiredState {
    redirects,
    headers,
    sources,
    skipped: declared.skipped,
    redirect_stats,
    header_stats,
  })
}
