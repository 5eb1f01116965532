//! Implementation of the `cairokit resolve` command.
//!
//! Prints the resolved option values for the target platform, the options
//! pruned from it, and the work directory the configuration builds in.

use anyhow::{Context, Result};
use serde_json::json;

use cairokit_lib::options::OptionValue;
use cairokit_lib::util::hash::Hashable;

use super::RecipeArgs;
use crate::output::{OutputFormat, print_json, print_stat, print_toggle, truncate_hash};

pub fn cmd_resolve(args: &RecipeArgs, output: OutputFormat) -> Result<()> {
  let pipeline = args.pipeline()?;
  let config = pipeline.resolve().context("Failed to resolve options")?;
  let hash = config.compute_hash().context("Failed to hash configuration")?;
  let work_dir = pipeline.work_dir(&config)?;

  if output.is_json() {
    return print_json(&json!({
      "config": config,
      "hash": hash.0,
      "work_dir": work_dir,
    }));
  }

  println!("{}", config.platform());
  print_stat("Link", &config.link_mode().to_string());
  print_stat("Config", truncate_hash(&hash.0));
  print_stat("Work dir", &work_dir.display().to_string());
  println!();
  for (name, value) in config.values() {
    match value {
      OptionValue::Bool(enabled) => print_toggle(*enabled, name),
      other => print_toggle(true, &format!("{name} = {other}")),
    }
  }
  for name in config.pruned() {
    print_toggle(false, &format!("{name} (not available on {})", config.os()));
  }
  Ok(())
}
