//! Implementation of the `hedgerules diff` command.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use tracing::info;

use hedgerules_lib::deploy::{Deployer, FunctionPreview, StorePreview};
use hedgerules_lib::function::{FunctionChange, FunctionSources};
use hedgerules_lib::provider::LocalEdge;

use super::{SiteArgs, load_desired_state};
use crate::output::{OutputFormat, print_info, print_json, symbols};

/// Show the puts and deletes each store would receive and whether each
/// function would be created or updated.
pub fn cmd_diff(args: &SiteArgs, format: OutputFormat) -> Result<()> {
  let config = args.load_config()?;
  let output_dir = config.output_dir()?.to_path_buf();
  let targets = config.targets()?;

  let desired = load_desired_state(&output_dir)?;

  let state_dir = config.state_dir()?;
  info!(state_dir = %state_dir.display(), "using local edge provider");
  let edge = LocalEdge::new(&state_dir);
  let deployer = Deployer::new(&edge, &edge, FunctionSources::bundled());

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let preview = rt
    .block_on(deployer.preview(&desired, &targets))
    .context("Diff failed")?;

  if format.is_json() {
    return print_json(&preview);
  }

  println!();
  print_store(&preview.redirects);
  print_store(&preview.headers);
  println!("Functions:");
  print_function(&preview.request_function);
  print_function(&preview.response_function);

  let changes = preview.redirects.plan.len() + preview.headers.plan.len();
  println!();
  if changes == 0 {
    print_info("Stores are up to date");
  } else {
    print_info(&format!("Would apply {} key change(s)", changes));
  }
  Ok(())
}

fn print_store(store: &StorePreview) {
  println!(
    "{} ({}): {} put(s), {} delete(s)",
    store.name,
    store.id,
    store.plan.puts.len(),
    store.plan.deletes.len()
  );
  for entry in &store.plan.puts {
    println!(
      "  {} {} {} {}",
      symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
      entry.key,
      symbols::ARROW,
      entry.value.replace('\n', " | ")
    );
  }
  for key in &store.plan.deletes {
    println!(
      "  {} {}",
      symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()),
      key
    );
  }
  println!();
}

fn print_function(function: &FunctionPreview) {
  match function.change {
    FunctionChange::Created => println!(
      "  {} {} (create)",
      symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
      function.name
    ),
    FunctionChange::Updated => println!(
      "  {} {} (update)",
      symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
      function.name
    ),
  }
}
