use std::path::Path;

use anyhow::{Context, Result};

use cairokit_lib::RecipeError;
use cairokit_lib::manifest::ArtifactManifest;

use crate::output::{OutputFormat, print_json};

/// Print the manifest of a packaged build.
pub fn cmd_manifest(package_dir: &Path, output: OutputFormat) -> Result<()> {
  let manifest = ArtifactManifest::read(package_dir)
    .map_err(RecipeError::from)
    .with_context(|| format!("Failed to read manifest in {}", package_dir.display()))?;

  if output.is_json() {
    print_json(&manifest)
  } else {
    print!("{manifest}");
    Ok(())
  }
}
