//! Implementation of the `cairokit build` command.
//!
//! Runs all four stages (options, dependency graph, source, build and
//! package) and reports the produced artifact tree.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use super::{RecipeArgs, runtime};
use crate::output::{OutputFormat, dir_size, format_bytes, print_json, print_stat, print_success, symbols};

pub fn cmd_build(args: &RecipeArgs, output: OutputFormat) -> Result<()> {
  let pipeline = args.pipeline()?;
  let started = Instant::now();

  let rt = runtime()?;
  let outcome = rt.block_on(pipeline.run()).context("Build failed")?;

  let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
  info!(package = %outcome.package_dir.display(), elapsed = %humantime::format_duration(elapsed), "build complete");

  if output.is_json() {
    return print_json(&outcome.manifest);
  }

  let manifest = &outcome.manifest;
  print_success(&format!(
    "Built {} {} for {}",
    manifest.name,
    manifest.version,
    outcome.config.platform()
  ));
  print_stat("Package", &outcome.package_dir.display().to_string());
  print_stat("Size", &format_bytes(dir_size(&outcome.package_dir)));
  print_stat("Headers", &manifest.header_count().to_string());
  print_stat("Time", &humantime::format_duration(elapsed).to_string());
  for lib in &manifest.libraries {
    let runtime = lib
      .runtime
      .as_ref()
      .map(|r| format!(" {} {}", symbols::ARROW, r.display()))
      .unwrap_or_default();
    println!("    {} ({}) {}{}", lib.name, lib.link, lib.file.display(), runtime);
  }
  Ok(())
}
