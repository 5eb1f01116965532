//! The four stages in order: resolve options, build the dependency graph,
//! prepare the source, build and package.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::build::{self, BuildContext, BuildLayout};
use crate::deps::{DependencyGraph, InstalledDeps};
use crate::error::RecipeError;
use crate::manifest::ArtifactManifest;
use crate::options::{Overrides, ResolvedConfig};
use crate::platform::paths;
use crate::profile::Profile;
use crate::recipe::Recipe;
use crate::source::{self, SourceTree};
use crate::util::hash::Hashable;

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct Outcome {
  pub config: ResolvedConfig,
  pub graph: DependencyGraph,
  pub source: SourceTree,
  pub manifest: ArtifactManifest,
  pub package_dir: PathBuf,
}

/// One invocation: a recipe, a profile and command-line overrides.
#[derive(Debug, Clone)]
pub struct Pipeline {
  recipe: Recipe,
  profile: Profile,
  overrides: Overrides,
  root: PathBuf,
}

impl Pipeline {
  /// `overrides` take precedence over the profile's `[options]`.
  pub fn new(profile: Profile, overrides: Overrides, root: &Path) -> Self {
    Self {
      recipe: Recipe::cairo(profile.version()),
      profile,
      overrides,
      root: root.to_path_buf(),
    }
  }

  pub fn recipe(&self) -> &Recipe {
    &self.recipe
  }

  pub fn profile(&self) -> &Profile {
    &self.profile
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Stage 1.
  pub fn resolve(&self) -> Result<ResolvedConfig, RecipeError> {
    let platform = self.profile.platform()?;
    let overrides = self.profile.overrides()?.merge(self.overrides.clone());
    let config = self.recipe.resolve(&platform, &overrides)?;
    info!(platform = %platform, link = %config.link_mode(), "resolved options");
    Ok(config)
  }

  /// Stage 2.
  pub fn graph(&self, config: &ResolvedConfig) -> Result<DependencyGraph, RecipeError> {
    Ok(self.recipe.graph(config)?)
  }

  /// Work directory for `config`: `<root>/work/cairo-<version>-<config hash>`.
  pub fn work_dir(&self, config: &ResolvedConfig) -> Result<PathBuf, RecipeError> {
    let hash = config.compute_hash()?;
    let key = format!("{}-{}-{}", self.recipe.name, self.recipe.version, hash);
    Ok(paths::work_dir(&self.root, &key))
  }

  pub fn installed(&self) -> InstalledDeps {
    self.profile.installed()
  }

  /// Stage 3.
  pub async fn prepare_source(&self, config: &ResolvedConfig) -> Result<SourceTree, RecipeError> {
    let request = self.profile.source_request(&self.recipe, config)?;
    let tree = source::prepare(
      &request,
      config.platform(),
      &self.work_dir(config)?,
      &paths::downloads_dir(&self.root),
      &self.profile.tools,
    )
    .await?;
    Ok(tree)
  }

  /// Stage 4 against an already prepared tree.
  pub async fn build(
    &self,
    config: &ResolvedConfig,
    graph: &DependencyGraph,
    source: &SourceTree,
  ) -> Result<ArtifactManifest, RecipeError> {
    let deps = self.installed();
    let ctx = BuildContext {
      config,
      graph,
      deps: &deps,
      source,
      tools: &self.profile.tools,
      layout: BuildLayout::new(&self.work_dir(config)?),
    };
    Ok(build::run(&ctx).await?)
  }

  /// All four stages. Missing dependency installs are reported before anything
  /// is downloaded. A package from an earlier run with the same configuration
  /// is removed first, so a failed run leaves no package.
  pub async fn run(&self) -> Result<Outcome, RecipeError> {
    let config = self.resolve()?;
    let graph = self.graph(&config)?;
    let layout = BuildLayout::new(&self.work_dir(&config)?);
    layout.discard_package()?;
    self.installed().check(&graph)?;

    let source = self.prepare_source(&config).await?;
    let manifest = self.build(&config, &graph, &source).await?;
    let package_dir = layout.package_dir();

    Ok(Outcome {
      config,
      graph,
      source,
      manifest,
      package_dir,
    })
  }
}
