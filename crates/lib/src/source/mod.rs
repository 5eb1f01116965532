//! Source preparation: fetch the upstream archive, extract it into a
//! normalized tree and apply the recipe's patches.

mod extract;
mod fetch;
mod patch;
mod workdir;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub use extract::{ExtractProcedure, extract, normalize_layout};
pub use fetch::{SourceLocation, archive_name, archive_url, fetch_archive};
pub use patch::{LedgerEntry, PatchError, PatchLedger, PatchOp, PatchSet, apply_patch_set};
pub use workdir::WorkDir;

use crate::consts::SOURCE_SUBFOLDER;
use crate::execute::{ToolError, ToolPaths};
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum SourceError {
  #[error("failed to fetch {url}: {message}")]
  FetchError { url: String, message: String },

  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("unexpected archive layout in {}: {reason}", archive.display())]
  ArchiveError { archive: PathBuf, reason: String },

  #[error("failed to extract {}: {source}", archive.display())]
  Extract {
    archive: PathBuf,
    #[source]
    source: ToolError,
  },

  #[error(transparent)]
  Patch(#[from] PatchError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// What to fetch and how to patch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRequest {
  pub version: String,
  pub location: SourceLocation,
  pub patches: PatchSet,
}

/// An extracted, patched upstream tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTree {
  pub root: PathBuf,
  pub version: String,
}

impl SourceTree {
  /// Wrap an already prepared tree.
  pub fn new(root: impl Into<PathBuf>, version: &str) -> Self {
    Self {
      root: root.into(),
      version: version.to_string(),
    }
  }

  pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
    self.root.join(relative)
  }

  /// Apply further patches to this tree, with the working directory scoped to its root.
  pub async fn apply(&self, patches: &PatchSet, tools: &ToolPaths) -> Result<usize, PatchError> {
    if patches.is_empty() {
      return Ok(0);
    }
    let _cwd = WorkDir::enter(&self.root)?;
    apply_patch_set(&self.root, patches, &tools.patch).await
  }
}

/// Fetch, extract and patch the upstream source into `work_dir/source_subfolder`.
///
/// Any previous tree at that location is replaced, so every call starts from a
/// pristine archive.
pub async fn prepare(
  request: &SourceRequest,
  platform: &Platform,
  work_dir: &Path,
  downloads_dir: &Path,
  tools: &ToolPaths,
) -> Result<SourceTree, SourceError> {
  info!(version = %request.version, from = %request.location.describe(), "preparing source");

  let archive = fetch_archive(&request.location, downloads_dir).await?;

  std::fs::create_dir_all(work_dir)?;
  let staging = tempfile::Builder::new().prefix(".staging-").tempdir_in(work_dir)?;
  extract(&archive, staging.path(), ExtractProcedure::for_platform(platform), tools).await?;

  let root = normalize_layout(staging.path(), &work_dir.join(SOURCE_SUBFOLDER), &archive)?;
  let tree = SourceTree::new(root, &request.version);

  let applied = tree.apply(&request.patches, tools).await?;
  info!(root = ?tree.root, patches = applied, "source ready");
  Ok(tree)
}
