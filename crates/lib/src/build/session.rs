use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::execute::ToolInvocation;

/// Environment shared by every tool invocation of one build step sequence.
///
/// Sessions are plain values: variables apply to invocations created through
/// [`ToolchainSession::invocation`] and never touch the orchestrator's own
/// process environment, so leaving the scope is dropping the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainSession {
  vars: BTreeMap<String, String>,
}

impl ToolchainSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_vars(vars: BTreeMap<String, String>) -> Self {
    Self { vars }
  }

  pub fn set(&mut self, key: &str, value: impl Into<String>) {
    self.vars.insert(key.to_string(), value.into());
  }

  pub fn var(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }

  pub fn vars(&self) -> &BTreeMap<String, String> {
    &self.vars
  }

  /// Put `entries` in front of a `separator`-joined list variable.
  pub fn prepend_list(&mut self, key: &str, entries: &[PathBuf], separator: &str) {
    let mut parts: Vec<String> = entries.iter().map(|p| p.display().to_string()).collect();
    if let Some(existing) = self.vars.get(key).filter(|v| !v.is_empty()) {
      parts.push(existing.clone());
    }
    self.vars.insert(key.to_string(), parts.join(separator));
  }

  /// Append a space-separated flag unless it is already present.
  pub fn append_flag(&mut self, key: &str, flag: &str) {
    let value = match self.vars.get(key).filter(|v| !v.is_empty()) {
      Some(existing) if existing.split_whitespace().any(|f| f == flag) => existing.clone(),
      Some(existing) => format!("{existing} {flag}"),
      None => flag.to_string(),
    };
    self.vars.insert(key.to_string(), value);
  }

  /// An invocation of `program` in `cwd` carrying this session's variables.
  pub fn invocation(&self, program: &str, cwd: &Path) -> ToolInvocation {
    ToolInvocation::new(program, cwd).envs(&self.vars)
  }
}
