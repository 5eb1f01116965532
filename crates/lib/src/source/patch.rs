//! Declarative source patching.
//!
//! A [`PatchSet`] is an ordered list of [`PatchOp`]s applied to a source tree.
//! Each applied op is recorded by identity in a ledger file at the tree root.
//! Applying an op the ledger already lists is an error, as is a replace rule
//! whose search text is absent: either means the tree is not in the state the
//! recipe expects.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::PATCH_LEDGER_FILENAME;
use crate::execute::{ToolError, ToolInvocation, run_tool};
use crate::util::hash::{Hashable, ObjectHash};

#[derive(Debug, Error)]
pub enum PatchError {
  #[error("patch already applied: {patch}")]
  AlreadyApplied { patch: String },

  #[error("patch target does not exist: {}", file.display())]
  FileMissing { file: PathBuf },

  #[error("search text not found in {}: {search:?}", file.display())]
  NoMatch { file: PathBuf, search: String },

  #[error("diff '{name}' was rejected: {source}")]
  DiffRejected {
    name: String,
    #[source]
    source: ToolError,
  },

  #[error("patch ledger {} is unreadable: {message}", path.display())]
  Ledger { path: PathBuf, message: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// One source modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PatchOp {
  /// Replace every occurrence of `search` in `file` (relative to the tree root).
  Replace {
    file: PathBuf,
    search: String,
    replace: String,
  },
  /// Apply a unified diff with `patch -p<strip>`.
  Diff { name: String, contents: String, strip: u32 },
}

impl Hashable for PatchOp {}

impl PatchOp {
  pub fn replace(file: impl Into<PathBuf>, search: &str, replace: &str) -> Self {
    Self::Replace {
      file: file.into(),
      search: search.to_string(),
      replace: replace.to_string(),
    }
  }

  pub fn diff(name: &str, contents: &str) -> Self {
    Self::Diff {
      name: name.to_string(),
      contents: contents.to_string(),
      strip: 1,
    }
  }
}

impl fmt::Display for PatchOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Replace { file, search, .. } => write!(f, "replace {:?} in {}", search, file.display()),
      Self::Diff { name, .. } => write!(f, "diff {name}"),
    }
  }
}

/// Ordered patch operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSet {
  ops: Vec<PatchOp>,
}

impl PatchSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, op: PatchOp) -> Self {
    self.ops.push(op);
    self
  }

  pub fn push(&mut self, op: PatchOp) {
    self.ops.push(op);
  }

  pub fn extend(&mut self, other: PatchSet) {
    self.ops.extend(other.ops);
  }

  pub fn iter(&self) -> impl Iterator<Item = &PatchOp> {
    self.ops.iter()
  }

  pub fn len(&self) -> usize {
    self.ops.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }
}

impl FromIterator<PatchOp> for PatchSet {
  fn from_iter<I: IntoIterator<Item = PatchOp>>(iter: I) -> Self {
    Self {
      ops: iter.into_iter().collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub id: ObjectHash,
  pub description: String,
}

/// Record of the patches applied to a tree, persisted at its root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchLedger {
  pub applied: Vec<LedgerEntry>,
}

impl PatchLedger {
  pub fn path(root: &Path) -> PathBuf {
    root.join(PATCH_LEDGER_FILENAME)
  }

  pub fn load(root: &Path) -> Result<Self, PatchError> {
    let path = Self::path(root);
    if !path.exists() {
      return Ok(Self::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_json::from_str(&contents).map_err(|e| PatchError::Ledger {
      path,
      message: e.to_string(),
    })
  }

  pub fn save(&self, root: &Path) -> Result<(), PatchError> {
    let path = Self::path(root);
    let json = serde_json::to_string_pretty(self).map_err(|e| PatchError::Ledger {
      path: path.clone(),
      message: e.to_string(),
    })?;
    std::fs::write(&path, json)?;
    Ok(())
  }

  pub fn contains(&self, id: &ObjectHash) -> bool {
    self.applied.iter().any(|e| &e.id == id)
  }
}

fn patch_id(op: &PatchOp) -> Result<ObjectHash, PatchError> {
  op.compute_hash().map_err(|e| PatchError::Ledger {
    path: PathBuf::from(PATCH_LEDGER_FILENAME),
    message: e.to_string(),
  })
}

/// Apply `set` to the tree at `root`, in order, stopping at the first failure.
///
/// Returns the number of operations applied.
pub async fn apply_patch_set(root: &Path, set: &PatchSet, patch_tool: &str) -> Result<usize, PatchError> {
  let mut ledger = PatchLedger::load(root)?;

  for op in set.iter() {
    let id = patch_id(op)?;
    if ledger.contains(&id) {
      return Err(PatchError::AlreadyApplied { patch: op.to_string() });
    }

    match op {
      PatchOp::Replace { file, search, replace } => apply_replace(root, file, search, replace)?,
      PatchOp::Diff { name, contents, strip } => apply_diff(root, name, contents, *strip, patch_tool).await?,
    }

    ledger.applied.push(LedgerEntry {
      id,
      description: op.to_string(),
    });
    ledger.save(root)?;
    info!(patch = %op, "applied patch");
  }

  Ok(set.len())
}

fn apply_replace(root: &Path, file: &Path, search: &str, replace: &str) -> Result<(), PatchError> {
  let path = root.join(file);
  if !path.is_file() {
    return Err(PatchError::FileMissing { file: file.to_path_buf() });
  }
  let contents = std::fs::read_to_string(&path)?;
  if !contents.contains(search) {
    return Err(PatchError::NoMatch {
      file: file.to_path_buf(),
      search: search.to_string(),
    });
  }
  let count = contents.matches(search).count();
  std::fs::write(&path, contents.replace(search, replace))?;
  debug!(file = ?file, occurrences = count, "replaced text");
  Ok(())
}

async fn apply_diff(root: &Path, name: &str, contents: &str, strip: u32, patch_tool: &str) -> Result<(), PatchError> {
  let mut diff_file = tempfile::Builder::new().prefix("cairokit-").suffix(".patch").tempfile()?;
  std::io::Write::write_all(&mut diff_file, contents.as_bytes())?;

  let invocation = ToolInvocation::new(patch_tool, root)
    .arg(format!("-p{strip}"))
    .arg("--forward")
    .arg("--batch")
    .arg("-i")
    .arg(diff_file.path().to_string_lossy());

  run_tool(&invocation).await.map_err(|source| PatchError::DiffRejected {
    name: name.to_string(),
    source,
  })?;
  Ok(())
}
