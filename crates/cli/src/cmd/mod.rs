mod build;
mod graph;
mod info;
mod manifest;
mod resolve;
mod source;

pub use build::cmd_build;
pub use graph::cmd_graph;
pub use info::cmd_info;
pub use manifest::cmd_manifest;
pub use resolve::cmd_resolve;
pub use source::cmd_source;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use cairokit_lib::RecipeError;
use cairokit_lib::options::Overrides;
use cairokit_lib::pipeline::Pipeline;
use cairokit_lib::platform::paths;
use cairokit_lib::profile::Profile;

/// Inputs shared by every command that runs the recipe.
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
  /// TOML profile with settings, options, source, tools and dependency roots
  #[arg(short, long)]
  pub profile: Option<PathBuf>,

  /// Option override, repeatable (e.g. -o shared=true)
  #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
  pub options: Vec<String>,

  /// Root for downloads and work directories (default: $CAIROKIT_ROOT, then the user cache)
  #[arg(long)]
  pub work_dir: Option<PathBuf>,
}

impl RecipeArgs {
  pub fn pipeline(&self) -> Result<Pipeline> {
    let profile = match &self.profile {
      Some(path) => Profile::load(path)
        .map_err(RecipeError::from)
        .with_context(|| format!("Failed to load profile: {}", path.display()))?,
      None => Profile::default(),
    };
    let overrides = Overrides::parse_pairs(self.options.as_slice())
      .map_err(RecipeError::from)
      .context("Invalid option override")?;
    let root = paths::resolve_root(self.work_dir.as_deref());
    let root = dunce::canonicalize(&root).unwrap_or(root);
    debug!(root = %root.display(), "work root");
    Ok(Pipeline::new(profile, overrides, &root))
  }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
