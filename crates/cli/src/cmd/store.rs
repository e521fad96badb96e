//! Implementation of the `hedgerules store` commands.
//!
//! Stores must exist before the first deploy; these commands create and list
//! them on the local edge provider.

use anyhow::{Context, Result};

use hedgerules_lib::provider::LocalEdge;

use super::ProviderArgs;
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

pub fn cmd_store_create(name: &str, args: &ProviderArgs) -> Result<()> {
  let edge = LocalEdge::new(args.state_dir()?);
  let store = edge
    .create_store(name)
    .with_context(|| format!("Failed to create key value store {}", name))?;

  print_success(&format!("Created key value store {}", store.name));
  print_stat("Id", &store.id);
  Ok(())
}

pub fn cmd_store_list(args: &ProviderArgs, format: OutputFormat) -> Result<()> {
  let edge = LocalEdge::new(args.state_dir()?);
  let stores = edge.stores().context("Failed to list key value stores")?;

  if format.is_json() {
    let list: Vec<_> = stores
      .iter()
      .map(|s| serde_json::json!({ "name": s.name, "id": s.id }))
      .collect();
    return print_json(&list);
  }

  if stores.is_empty() {
    print_info(&format!(
      "No key value stores in {}. Run 'hedgerules store create <name>' to create one.",
      edge.root().display()
    ));
    return Ok(());
  }

  for store in &stores {
    println!("{}\t{}", store.name, store.id);
  }
  Ok(())
}
