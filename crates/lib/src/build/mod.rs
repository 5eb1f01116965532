//! Build driver.
//!
//! The driver picks one [`Strategy`] from the compiler identity and runs it to
//! completion:
//!
//! - [`Strategy::ConfigureBuild`]: autotools `configure`, `make`, `make install`
//!   with a staged pkg-config directory (every toolchain except MSVC)
//! - [`Strategy::DirectMakefileBuild`]: cairo's vendored `Makefile.win32`
//!   inside an activated MSVC environment
//!
//! Both produce [`BuildOutputs`], which [`package`] turns into the final
//! package tree and [`ArtifactManifest`].

pub mod configure;
pub mod makefile;
pub mod msvc_env;
pub mod package;
pub mod pkgconfig;
mod session;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use package::package;
pub use session::ToolchainSession;

use crate::deps::{DependencyGraph, DepsError, InstalledDeps};
use crate::execute::{ToolError, ToolPaths};
use crate::manifest::{ArtifactManifest, ManifestError};
use crate::options::{OptionError, ResolvedConfig};
use crate::source::{PatchError, SourceTree};
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum BuildError {
  /// An external build step exited unsuccessfully or could not start.
  #[error("tool invocation failed: {0}")]
  Tool(#[from] ToolError),

  #[error(transparent)]
  Patch(#[from] PatchError),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Deps(#[from] DepsError),

  #[error(transparent)]
  Option(#[from] OptionError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("toolchain environment unavailable: {message}")]
  Environment { message: String },

  #[error("expected build output missing: {what} (looked in {})", searched.display())]
  MissingArtifact { what: String, searched: PathBuf },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Toolchain-specific build procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  ConfigureBuild,
  DirectMakefileBuild,
}

impl Strategy {
  pub fn select(config: &ResolvedConfig) -> Self {
    if config.compiler().is_msvc() {
      Self::DirectMakefileBuild
    } else {
      Self::ConfigureBuild
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ConfigureBuild => write!(f, "configure"),
      Self::DirectMakefileBuild => write!(f, "direct-makefile"),
    }
  }
}

/// Directories the build writes to, all under one work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
  work_dir: PathBuf,
}

impl BuildLayout {
  pub fn new(work_dir: &Path) -> Self {
    Self {
      work_dir: work_dir.to_path_buf(),
    }
  }

  pub fn work_dir(&self) -> &Path {
    &self.work_dir
  }

  /// `make install` prefix.
  pub fn install_dir(&self) -> PathBuf {
    self.work_dir.join("install")
  }

  /// Dependency `.pc` files staged for `configure`.
  pub fn pkgconfig_dir(&self) -> PathBuf {
    self.work_dir.join("pkgconfig")
  }

  /// `.pc` files synthesized for the vendored makefile build.
  pub fn generated_pkgconfig_dir(&self) -> PathBuf {
    self.work_dir.join("pkgconfig-generated")
  }

  /// Final package tree.
  pub fn package_dir(&self) -> PathBuf {
    self.work_dir.join("package")
  }

  /// Where the package tree is assembled before it is moved into place.
  pub fn package_staging_dir(&self) -> PathBuf {
    self.work_dir.join("package.partial")
  }

  /// Remove the package left by an earlier run, so a failing run never leaves
  /// one behind.
  pub fn discard_package(&self) -> std::io::Result<()> {
    for dir in [self.package_dir(), self.package_staging_dir()] {
      if dir.exists() {
        debug!(dir = ?dir, "removing previous package");
        std::fs::remove_dir_all(&dir)?;
      }
    }
    Ok(())
  }
}

/// Inputs of the build stage.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
  pub config: &'a ResolvedConfig,
  pub graph: &'a DependencyGraph,
  pub deps: &'a InstalledDeps,
  pub source: &'a SourceTree,
  pub tools: &'a ToolPaths,
  pub layout: BuildLayout,
}

/// Files a strategy produced, before packaging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutputs {
  pub headers: Vec<PathBuf>,
  /// Link-time files: static archives, import libraries, shared objects.
  pub libraries: Vec<PathBuf>,
  /// DLLs.
  pub runtimes: Vec<PathBuf>,
  pub pkgconfig: Vec<PathBuf>,
}

/// Run the selected strategy and package its outputs.
pub async fn run(ctx: &BuildContext<'_>) -> Result<ArtifactManifest, BuildError> {
  ctx.layout.discard_package()?;
  ctx.deps.check(ctx.graph)?;
  let strategy = Strategy::select(ctx.config);
  info!(strategy = %strategy, platform = %ctx.config.platform(), "starting build");

  let outputs = match strategy {
    Strategy::ConfigureBuild => configure::run(ctx).await?,
    Strategy::DirectMakefileBuild => {
      let session = msvc_env::activate(ctx).await?;
      makefile::run(ctx, &session).await?
    }
  };

  let manifest = package(ctx, &outputs)?;
  info!(package = ?ctx.layout.package_dir(), libraries = ?manifest.library_names(), "build complete");
  Ok(manifest)
}
