use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Scoped change of the process working directory.
///
/// `enter` switches into a directory; dropping the guard switches back, on
/// every exit path including early returns and unwinding. Guards nest: the
/// innermost must be dropped first, which Rust's scoping already enforces for
/// guards held in locals.
#[derive(Debug)]
pub struct WorkDir {
  previous: PathBuf,
  current: PathBuf,
}

impl WorkDir {
  pub fn enter(path: &Path) -> io::Result<Self> {
    let previous = std::env::current_dir()?;
    let current = dunce::canonicalize(path)?;
    std::env::set_current_dir(&current)?;
    debug!(from = ?previous, to = ?current, "entered work dir");
    Ok(Self { previous, current })
  }

  pub fn path(&self) -> &Path {
    &self.current
  }
}

impl Drop for WorkDir {
  fn drop(&mut self) {
    if let Err(e) = std::env::set_current_dir(&self.previous) {
      warn!(dir = ?self.previous, error = %e, "failed to restore working directory");
    } else {
      debug!(to = ?self.previous, "left work dir");
    }
  }
}
