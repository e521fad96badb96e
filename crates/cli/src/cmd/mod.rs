mod deploy;
mod diff;
mod store;
mod version;

pub use deploy::cmd_deploy;
pub use diff::cmd_diff;
pub use store::{cmd_store_create, cmd_store_list};
pub use version::cmd_version;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

use hedgerules_lib::config::{Config, Overrides};
use hedgerules_lib::consts::{DEFAULT_CONFIG_FILENAME, MAX_TOTAL_BYTES};
use hedgerules_lib::deploy::{DeployError, DesiredState, build_desired_state};
use hedgerules_lib::kvs::DataStats;

use crate::output::{print_error, print_warning};

/// Config file and flag overrides shared by `deploy` and `diff`.
#[derive(Debug, Args)]
pub struct SiteArgs {
  /// Path to config file
  #[arg(long, default_value = DEFAULT_CONFIG_FILENAME)]
  config: PathBuf,

  /// Static-site build output directory
  #[arg(long)]
  output_dir: Option<PathBuf>,

  /// Key-value store name for redirects
  #[arg(long)]
  redirects_kvs_name: Option<String>,

  /// Key-value store name for headers
  #[arg(long)]
  headers_kvs_name: Option<String>,

  /// Edge function name for viewer-request
  #[arg(long)]
  request_function_name: Option<String>,

  /// Edge function name for viewer-response
  #[arg(long)]
  response_function_name: Option<String>,

  /// Region override
  #[arg(long)]
  region: Option<String>,

  /// Inject debug headers into the viewer-response function
  #[arg(long)]
  debug_headers: bool,

  /// Local edge provider state directory
  #[arg(long)]
  state_dir: Option<PathBuf>,
}

impl SiteArgs {
  pub fn load_config(&self) -> Result<Config> {
    let config = Config::load(&self.config)?;
    debug!(path = %self.config.display(), "applying flag overrides");
    Ok(config.with_overrides(Overrides {
      output_dir: self.output_dir.clone(),
      region: self.region.clone(),
      redirects_kvs_name: self.redirects_kvs_name.clone(),
      headers_kvs_name: self.headers_kvs_name.clone(),
      request_function_name: self.request_function_name.clone(),
      response_function_name: self.response_function_name.clone(),
      debug_headers: self.debug_headers,
      state_dir: self.state_dir.clone(),
    }))
  }
}

/// Config file and state directory for commands that only touch the provider.
#[derive(Debug, Args)]
pub struct ProviderArgs {
  /// Path to config file
  #[arg(long, default_value = DEFAULT_CONFIG_FILENAME)]
  config: PathBuf,

  /// Local edge provider state directory
  #[arg(long)]
  state_dir: Option<PathBuf>,
}

impl ProviderArgs {
  pub fn state_dir(&self) -> Result<PathBuf> {
    let config = Config::load(&self.config)?.with_overrides(Overrides {
      state_dir: self.state_dir.clone(),
      ..Overrides::default()
    });
    Ok(config.state_dir()?)
  }
}

/// Build and validate the desired state, reporting problems and capacity on
/// stderr.
pub(crate) fn load_desired_state(output_dir: &Path) -> Result<DesiredState> {
  let desired = match build_desired_state(output_dir) {
    Ok(desired) => desired,
    Err(DeployError::Validation(errors)) => {
      print_error("Validation errors:");
      for e in &errors {
        eprintln!("  {}", e);
      }
      bail!("validation failed with {} error(s)", errors.len());
    }
    Err(e) => return Err(e).context("Failed to read site output"),
  };

  if !desired.skipped.is_empty() {
    print_warning(&format!(
      "Skipped {} invalid redirect declaration(s)",
      desired.skipped.len()
    ));
  }

  eprintln!();
  eprintln!("KVS capacity:");
  eprintln!("  {}", capacity_line("Redirects:", &desired.redirect_stats));
  eprintln!("  {}", capacity_line("Headers:  ", &desired.header_stats));
  Ok(desired)
}

fn capacity_line(label: &str, stats: &DataStats) -> String {
  format!(
    "{} {} keys, {} / {} bytes ({:.1}%)",
    label,
    stats.num_keys,
    stats.total_bytes,
    MAX_TOTAL_BYTES,
    stats.percent_of(MAX_TOTAL_BYTES)
  )
}
