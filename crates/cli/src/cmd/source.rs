//! Implementation of the `cairokit source` command.
//!
//! Fetches, extracts and patches the upstream source for the resolved
//! configuration without building it.

use anyhow::{Context, Result};
use serde_json::json;

use cairokit_lib::RecipeError;

use super::{RecipeArgs, runtime};
use crate::output::{OutputFormat, print_json, print_stat, print_success};

pub fn cmd_source(args: &RecipeArgs, output: OutputFormat) -> Result<()> {
  let pipeline = args.pipeline()?;
  let config = pipeline.resolve().context("Failed to resolve options")?;
  let request = pipeline
    .profile()
    .source_request(pipeline.recipe(), &config)
    .map_err(RecipeError::from)?;

  let rt = runtime()?;
  let tree = rt
    .block_on(pipeline.prepare_source(&config))
    .context("Failed to prepare source")?;

  if output.is_json() {
    return print_json(&json!({
      "version": tree.version,
      "root": tree.root,
      "origin": request.location.describe(),
      "patches": request.patches.iter().map(ToString::to_string).collect::<Vec<_>>(),
    }));
  }

  print_success(&format!("cairo {} ready", tree.version));
  print_stat("Source", &tree.root.display().to_string());
  print_stat("Origin", &request.location.describe());
  print_stat("Patches", &request.patches.len().to_string());
  for patch in request.patches.iter() {
    println!("    {patch}");
  }
  Ok(())
}
