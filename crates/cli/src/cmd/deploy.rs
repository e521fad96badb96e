//! Implementation of the `hedgerules deploy` command.
//!
//! Reads the site output, validates it, then converges the redirects store,
//! the headers store and both edge functions on the local edge provider.
//! With `--dry-run` it stops after validation and prints the store contents.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use hedgerules_lib::deploy::{DeployReport, Deployer, DesiredState};
use hedgerules_lib::function::{FunctionChange, FunctionSources, PublishReport};
use hedgerules_lib::kvs::Entry;
use hedgerules_lib::provider::LocalEdge;

use super::{SiteArgs, load_desired_state};
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

#[derive(Serialize)]
struct DryRun<'a> {
  redirects: &'a [Entry],
  headers: &'a [Entry],
}

pub fn cmd_deploy(args: &SiteArgs, dry_run: bool, format: OutputFormat) -> Result<()> {
  let config = args.load_config()?;
  let output_dir = config.output_dir()?.to_path_buf();
  // Remote names are only needed when something is written.
  let targets = if dry_run { None } else { Some(config.targets()?) };

  let desired = load_desired_state(&output_dir)?;

  let Some(targets) = targets else {
    print_dry_run(&desired, format)?;
    eprintln!();
    eprintln!("Dry run complete. No changes made.");
    return Ok(());
  };

  let state_dir = config.state_dir()?;
  info!(state_dir = %state_dir.display(), "using local edge provider");
  if let Some(region) = &config.region {
    debug!(region = %region, "region has no effect on the local edge provider");
  }
  let edge = LocalEdge::new(&state_dir);
  let deployer = Deployer::new(&edge, &edge, FunctionSources::bundled());

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(deployer.deploy(&desired, &targets))
    .context("Deploy failed")?;

  if format.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report);
  }

  Ok(())
}

fn print_dry_run(desired: &DesiredState, format: OutputFormat) -> Result<()> {
  if format.is_json() {
    return print_json(&DryRun {
      redirects: desired.redirects.entries(),
      headers: desired.headers.entries(),
    });
  }

  println!();
  println!("=== Redirects ===");
  for entry in &desired.redirects {
    println!("{} -> {}", entry.key, entry.value);
  }
  println!();
  println!("=== Headers ===");
  for entry in &desired.headers {
    println!("{}:\n{}\n---", entry.key, entry.value);
  }
  Ok(())
}

fn print_report(report: &DeployReport) {
  println!();
  for store in [&report.redirects, &report.headers] {
    print_info(&format!("Store {}", store.name));
    print_stat("Puts", &store.applied.puts.to_string());
    print_stat("Deletes", &store.applied.deletes.to_string());
    print_stat("Batches", &store.applied.batches.to_string());
  }
  for function in [&report.request_function, &report.response_function] {
    print_info(&function_line(function));
  }
  println!();
  print_success("Deploy complete.");
}

fn function_line(report: &PublishReport) -> String {
  let change = match report.change {
    FunctionChange::Created => "created",
    FunctionChange::Updated => "updated",
  };
  format!("Function {} {} and published ({})", report.name, change, report.version)
}
