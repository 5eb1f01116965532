//! Archive extraction and layout normalization.

use std::path::{Path, PathBuf};

use tracing::info;

use super::SourceError;
use crate::execute::{ToolError, ToolInvocation, ToolPaths, run_tool};
use crate::platform::Platform;

/// How a `.tar.xz` archive is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractProcedure {
  /// One `tar -xJf` call.
  Combined,
  /// `7z x` for the xz layer, then `7z x` for the inner tar.
  TwoStep,
}

impl ExtractProcedure {
  /// Chosen from the platform alone; archive contents are never probed.
  pub fn for_platform(platform: &Platform) -> Self {
    if platform.os.is_windows() {
      Self::TwoStep
    } else {
      Self::Combined
    }
  }
}

/// Unpack `archive` into the empty directory `staging`.
pub async fn extract(
  archive: &Path,
  staging: &Path,
  procedure: ExtractProcedure,
  tools: &ToolPaths,
) -> Result<(), SourceError> {
  info!(archive = ?archive, procedure = ?procedure, "extracting archive");
  let archive_str = archive.to_string_lossy().to_string();
  let extract_err = |source: ToolError| SourceError::Extract {
    archive: archive.to_path_buf(),
    source,
  };

  match procedure {
    ExtractProcedure::Combined => {
      let invocation = ToolInvocation::new(&tools.tar, staging)
        .arg("-xJf")
        .arg(&archive_str)
        .arg("-C")
        .arg(staging.to_string_lossy());
      run_tool(&invocation).await.map_err(extract_err)?;
    }
    ExtractProcedure::TwoStep => {
      let outer = tempfile::Builder::new().prefix("xz-").tempdir()?;
      let invocation = ToolInvocation::new(&tools.sevenzip, outer.path())
        .arg("x")
        .arg("-y")
        .arg(&archive_str)
        .arg(format!("-o{}", outer.path().display()));
      run_tool(&invocation).await.map_err(extract_err)?;

      let tarball = single_entry(outer.path(), archive)?;
      let invocation = ToolInvocation::new(&tools.sevenzip, staging)
        .arg("x")
        .arg("-y")
        .arg(tarball.to_string_lossy())
        .arg(format!("-o{}", staging.display()));
      run_tool(&invocation).await.map_err(extract_err)?;
      // `outer` and the intermediate tarball are removed here.
    }
  }
  Ok(())
}

fn single_entry(dir: &Path, archive: &Path) -> Result<PathBuf, SourceError> {
  let entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
  match entries.as_slice() {
    [entry] => Ok(entry.path()),
    _ => Err(SourceError::ArchiveError {
      archive: archive.to_path_buf(),
      reason: format!("expected exactly one entry after decompression, found {}", entries.len()),
    }),
  }
}

/// Move the single top-level directory of `staging` to `target`.
///
/// Fails with `ArchiveError` unless `staging` holds exactly one entry and it
/// is a directory. An existing `target` is replaced.
pub fn normalize_layout(staging: &Path, target: &Path, archive: &Path) -> Result<PathBuf, SourceError> {
  let top = single_entry(staging, archive)?;
  if !top.is_dir() {
    return Err(SourceError::ArchiveError {
      archive: archive.to_path_buf(),
      reason: format!("top-level entry {} is not a directory", top.display()),
    });
  }

  if target.exists() {
    info!(target = ?target, "replacing previous source tree");
    std::fs::remove_dir_all(target)?;
  }
  std::fs::rename(&top, target)?;
  info!(from = ?top, to = ?target, "normalized source tree");
  Ok(target.to_path_buf())
}
