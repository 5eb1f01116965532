use crate::consts::{APP_NAME, ROOT_ENV};
use std::path::{Path, PathBuf};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| std::env::temp_dir())
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| std::env::temp_dir())
}

/// Returns the directory for cache files for the application
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  std::env::var("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Local"))
    .join(APP_NAME)
    .join("Cache")
}

/// Returns the directory for cache files for the application
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Root of all work directories. `CAIROKIT_ROOT` takes precedence over the cache dir.
pub fn root_dir() -> PathBuf {
  match std::env::var(ROOT_ENV) {
    Ok(root) if !root.is_empty() => PathBuf::from(root),
    _ => cache_dir(),
  }
}

/// An explicit root (`--work-dir`) or [`root_dir`].
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
  explicit.map(Path::to_path_buf).unwrap_or_else(root_dir)
}

/// Shared download cache
pub fn downloads_dir(root: &Path) -> PathBuf {
  root.join("downloads")
}

/// Per-build work directory, keyed by the configuration hash
pub fn work_dir(root: &Path, key: &str) -> PathBuf {
  root.join("work").join(key)
}
