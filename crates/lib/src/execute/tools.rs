use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Programs the orchestrator shells out to, overridable from the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
  pub make: String,
  /// Shell used to run `configure` and `autogen.sh`.
  pub shell: String,
  pub tar: String,
  pub sevenzip: String,
  pub patch: String,
  /// Explicit `vcvarsall.bat`; located automatically when unset.
  pub vcvars: Option<PathBuf>,
  /// Parallel make jobs.
  pub jobs: usize,
}

impl Default for ToolPaths {
  fn default() -> Self {
    Self {
      make: "make".to_string(),
      shell: if cfg!(windows) { "bash" } else { "sh" }.to_string(),
      tar: "tar".to_string(),
      sevenzip: "7z".to_string(),
      patch: "patch".to_string(),
      vcvars: None,
      jobs: num_cpus(),
    }
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
