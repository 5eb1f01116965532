//! Implementation of the `cairokit graph` command.
//!
//! Prints the dependency declarations for the resolved configuration in the
//! order the build links them, for the package manager's resolver.

use anyhow::{Context, Result};

use super::RecipeArgs;
use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_graph(args: &RecipeArgs, output: OutputFormat) -> Result<()> {
  let pipeline = args.pipeline()?;
  let config = pipeline.resolve().context("Failed to resolve options")?;
  let graph = pipeline.graph(&config).context("Failed to build dependency graph")?;

  if output.is_json() {
    return print_json(&graph);
  }

  println!("{}", config.platform());
  print_stat("Requires", &graph.requires().len().to_string());
  for spec in graph.requires() {
    let note = if spec.is_system() { " (system)" } else { "" };
    println!("    {spec}{note}");
  }
  if !graph.tool_requires().is_empty() {
    print_stat("Build tools", &graph.tool_requires().len().to_string());
    for spec in graph.tool_requires() {
      println!("    {spec}");
    }
  }
  Ok(())
}
