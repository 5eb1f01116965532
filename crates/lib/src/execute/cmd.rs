use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
  /// The program could not be started at all.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}\n{stdout}{stderr}")]
  Failed {
    cmd: String,
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },
}

/// A fully specified subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
  pub program: String,
  pub args: Vec<String>,
  /// Variables added on top of the inherited environment.
  pub env: BTreeMap<String, String>,
  pub cwd: PathBuf,
}

impl ToolInvocation {
  pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: BTreeMap::new(),
      cwd: cwd.to_path_buf(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
    self.env.insert(key.to_string(), value.into());
    self
  }

  pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
    for (key, value) in vars {
      self.env.insert(key.clone(), value.clone());
    }
    self
  }

  /// Command line as it would be typed, for logs and error messages.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .map(quote)
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl fmt::Display for ToolInvocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command_line())
  }
}

fn quote(part: &str) -> String {
  if part.is_empty() || part.contains(char::is_whitespace) {
    format!("\"{part}\"")
  } else {
    part.to_string()
  }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
  pub stdout: String,
  pub stderr: String,
}

/// Run a tool to completion.
///
/// The child inherits the current environment with `invocation.env` layered on
/// top, runs in `invocation.cwd`, and has its output captured. A non-zero exit
/// is returned as [`ToolError::Failed`] with the output untouched.
pub async fn run_tool(invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
  info!(cmd = %invocation, "running tool");
  debug!(cwd = ?invocation.cwd, env = ?invocation.env, "tool context");

  let mut command = Command::new(&invocation.program);
  command
    .args(&invocation.args)
    .current_dir(&invocation.cwd)
    .envs(&invocation.env)
    .kill_on_drop(true);

  let output = command.output().await.map_err(|source| ToolError::Spawn {
    program: invocation.program.clone(),
    source,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout).to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).to_string();

  if !output.status.success() {
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "tool stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "tool stdout");
    }
    return Err(ToolError::Failed {
      cmd: invocation.command_line(),
      code: output.status.code(),
      stdout,
      stderr,
    });
  }

  if !stdout.is_empty() {
    debug!(stdout = %stdout.trim_end(), "tool output");
  }

  Ok(ToolOutput { stdout, stderr })
}
