//! Archive retrieval.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::SourceError;
use crate::consts::PACKAGE_NAME;
use crate::util::hash::{hash_bytes, hash_file};

/// Where the upstream archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLocation {
  Url { url: String, sha256: Option<String> },
  Local { path: PathBuf, sha256: Option<String> },
}

impl SourceLocation {
  /// The release archive for `version` under `base`.
  pub fn release(base: &str, version: &str, sha256: Option<String>) -> Self {
    Self::Url {
      url: archive_url(base, version),
      sha256,
    }
  }

  pub fn describe(&self) -> String {
    match self {
      Self::Url { url, .. } => url.clone(),
      Self::Local { path, .. } => path.display().to_string(),
    }
  }
}

/// `{base}/cairo-{version}.tar.xz`
pub fn archive_url(base: &str, version: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), archive_name(version))
}

pub fn archive_name(version: &str) -> String {
  format!("{PACKAGE_NAME}-{version}.tar.xz")
}

/// Make the archive available locally and return its path.
///
/// URLs are downloaded into `downloads_dir`; a cached copy is reused only when
/// an expected SHA-256 is known and matches. Local archives are used in place.
pub async fn fetch_archive(location: &SourceLocation, downloads_dir: &Path) -> Result<PathBuf, SourceError> {
  match location {
    SourceLocation::Local { path, sha256 } => {
      if !path.is_file() {
        return Err(SourceError::FetchError {
          url: path.display().to_string(),
          message: "archive does not exist".to_string(),
        });
      }
      if let Some(expected) = sha256 {
        verify_file(path, &path.display().to_string(), expected)?;
      }
      info!(path = ?path, "using local archive");
      Ok(path.clone())
    }
    SourceLocation::Url { url, sha256 } => download(url, sha256.as_deref(), downloads_dir).await,
  }
}

fn verify_file(path: &Path, label: &str, expected: &str) -> Result<(), SourceError> {
  let actual = hash_file(path)?.0;
  if !actual.eq_ignore_ascii_case(expected) {
    return Err(SourceError::HashMismatch {
      url: label.to_string(),
      expected: expected.to_string(),
      actual,
    });
  }
  Ok(())
}

async fn download(url: &str, expected_sha256: Option<&str>, downloads_dir: &Path) -> Result<PathBuf, SourceError> {
  fs::create_dir_all(downloads_dir).await?;

  let dest_path = downloads_dir.join(url_to_filename(url));

  if dest_path.exists()
    && let Some(expected) = expected_sha256
  {
    debug!(path = ?dest_path, "checking cached archive");
    match verify_file(&dest_path, url, expected) {
      Ok(()) => {
        info!(path = ?dest_path, "using cached archive");
        return Ok(dest_path);
      }
      Err(e) => debug!(error = %e, "cached archive rejected, re-downloading"),
    }
  }

  info!(url = %url, "fetching archive");

  let fetch_err = |message: String| SourceError::FetchError {
    url: url.to_string(),
    message,
  };

  let response = reqwest::get(url).await.map_err(|e| fetch_err(e.to_string()))?;
  if !response.status().is_success() {
    return Err(fetch_err(format!("HTTP {}", response.status())));
  }
  let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;

  if let Some(expected) = expected_sha256 {
    let actual = hash_bytes(&bytes).0;
    if !actual.eq_ignore_ascii_case(expected) {
      return Err(SourceError::HashMismatch {
        url: url.to_string(),
        expected: expected.to_string(),
        actual,
      });
    }
  }

  let partial = dest_path.with_extension("part");
  let mut file = fs::File::create(&partial).await?;
  file.write_all(&bytes).await?;
  file.flush().await?;
  drop(file);
  fs::rename(&partial, &dest_path).await?;

  info!(path = ?dest_path, size = bytes.len(), "download complete");
  Ok(dest_path)
}

/// Last URL path component, sanitized; a hash of the URL when nothing usable remains.
fn url_to_filename(url: &str) -> String {
  if let Some(filename) = url.rsplit('/').next() {
    let filename = filename.split('?').next().unwrap_or(filename);
    let sanitized: String = filename
      .chars()
      .map(|c| {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
          c
        } else {
          '_'
        }
      })
      .collect();

    if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
      return sanitized;
    }
  }

  format!("download_{}", &hash_bytes(url.as_bytes()).0[..16])
}
