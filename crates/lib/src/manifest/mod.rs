//! Consumer-facing description of a packaged build.
//!
//! The [`ArtifactManifest`] is written once, at the end of the build stage, as
//! `cairokit-manifest.json` in the package root. Downstream tooling reads it
//! back to learn which libraries to link, which defines to set and which
//! system libraries to add.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("no manifest at {}", path.display())]
  NotFound { path: PathBuf },

  #[error("invalid manifest {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ManifestError {
  fn from(source: serde_json::Error) -> Self {
    Self::Parse {
      path: PathBuf::new(),
      source,
    }
  }
}

/// Path of the manifest inside a package directory.
pub fn manifest_path(package_dir: &Path) -> PathBuf {
  package_dir.join(crate::consts::MANIFEST_FILENAME)
}
