use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{DependencyGraph, DepsError};

/// Where the package manager installed one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledDep {
  pub root: PathBuf,
  /// Library names to link, without prefix or extension (e.g. `z`, `png16`).
  #[serde(default)]
  pub libs: Vec<String>,
  #[serde(default = "default_include_dirs")]
  pub include_dirs: Vec<String>,
  #[serde(default = "default_lib_dirs")]
  pub lib_dirs: Vec<String>,
}

fn default_include_dirs() -> Vec<String> {
  vec!["include".to_string()]
}

fn default_lib_dirs() -> Vec<String> {
  vec!["lib".to_string()]
}

impl InstalledDep {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      libs: Vec::new(),
      include_dirs: default_include_dirs(),
      lib_dirs: default_lib_dirs(),
    }
  }

  pub fn with_libs(mut self, libs: &[&str]) -> Self {
    self.libs = libs.iter().map(|l| l.to_string()).collect();
    self
  }

  pub fn include_paths(&self) -> Vec<PathBuf> {
    self.include_dirs.iter().map(|d| self.root.join(d)).collect()
  }

  pub fn lib_paths(&self) -> Vec<PathBuf> {
    self.lib_dirs.iter().map(|d| self.root.join(d)).collect()
  }

  pub fn pkgconfig_dirs(&self) -> Vec<PathBuf> {
    self.lib_paths().into_iter().map(|d| d.join("pkgconfig")).collect()
  }

  /// First declared library, falling back to the component name.
  pub fn primary_lib<'a>(&'a self, name: &'a str) -> &'a str {
    self.libs.first().map(String::as_str).unwrap_or(name)
  }
}

/// Install locations of resolved dependencies, keyed by component name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstalledDeps(BTreeMap<String, InstalledDep>);

impl InstalledDeps {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: &str, dep: InstalledDep) {
    self.0.insert(name.to_string(), dep);
  }

  pub fn with(mut self, name: &str, dep: InstalledDep) -> Self {
    self.insert(name, dep);
    self
  }

  pub fn get(&self, name: &str) -> Result<&InstalledDep, DepsError> {
    self.0.get(name).ok_or_else(|| DepsError::MissingDependency {
      name: name.to_string(),
    })
  }

  pub fn find(&self, name: &str) -> Option<&InstalledDep> {
    self.0.get(name)
  }

  /// Ensure every versioned requirement in `graph` has an install root.
  ///
  /// System dependencies may be absent; they are found through the host's own paths.
  pub fn check(&self, graph: &DependencyGraph) -> Result<(), DepsError> {
    for spec in graph.requires().iter().filter(|s| !s.is_system()) {
      self.get(&spec.name)?;
    }
    Ok(())
  }

  /// Installed entries in `graph` order.
  pub fn ordered<'a>(&'a self, graph: &'a DependencyGraph) -> impl Iterator<Item = (&'a str, &'a InstalledDep)> + 'a {
    graph
      .requires()
      .iter()
      .filter_map(|spec| self.0.get(&spec.name).map(|dep| (spec.name.as_str(), dep)))
  }
}
