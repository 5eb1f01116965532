//! Dependency graph construction.
//!
//! [`build_graph`] turns a [`ResolvedConfig`](crate::options::ResolvedConfig)
//! and a recipe's dependency rules into an ordered [`DependencyGraph`]. Core
//! rules are applied first, optional rules second; both passes go through
//! [`DependencyGraph::require`], which merges compatible requirements and
//! rejects incompatible ones.
//!
//! [`InstalledDeps`] carries where the package manager installed each resolved
//! dependency, which the build driver needs for paths and link names.

mod graph;
mod installed;

pub use graph::*;
pub use installed::*;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepsError {
  /// Two requirements for the same component cannot both be satisfied.
  #[error("dependency conflict for '{name}': {existing} is incompatible with {requested}")]
  DependencyConflict {
    name: String,
    existing: String,
    requested: String,
  },

  /// A required component has no install location.
  #[error("dependency '{name}' is required but no install root was provided")]
  MissingDependency { name: String },
}
