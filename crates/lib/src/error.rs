//! Top-level error and its taxonomy.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::build::BuildError;
use crate::deps::DepsError;
use crate::manifest::ManifestError;
use crate::options::OptionError;
use crate::profile::ProfileError;
use crate::source::SourceError;

/// Coarse classification reported to users and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
  InvalidOption,
  UnsupportedOption,
  DependencyConflict,
  MissingDependency,
  FetchError,
  ArchiveError,
  PatchError,
  ToolInvocationError,
  MissingArtifact,
  Configuration,
  Io,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

#[derive(Debug, Error)]
pub enum RecipeError {
  #[error(transparent)]
  Option(#[from] OptionError),

  #[error(transparent)]
  Deps(#[from] DepsError),

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Profile(#[from] ProfileError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("failed to hash configuration: {0}")]
  Hash(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

fn option_kind(e: &OptionError) -> ErrorKind {
  match e {
    OptionError::InvalidOption { .. } => ErrorKind::InvalidOption,
    OptionError::UnsupportedOption { .. } => ErrorKind::UnsupportedOption,
  }
}

fn deps_kind(e: &DepsError) -> ErrorKind {
  match e {
    DepsError::DependencyConflict { .. } => ErrorKind::DependencyConflict,
    DepsError::MissingDependency { .. } => ErrorKind::MissingDependency,
  }
}

impl RecipeError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Option(e) => option_kind(e),
      Self::Deps(e) => deps_kind(e),
      Self::Source(e) => match e {
        SourceError::FetchError { .. } | SourceError::HashMismatch { .. } => ErrorKind::FetchError,
        SourceError::ArchiveError { .. } | SourceError::Extract { .. } => ErrorKind::ArchiveError,
        SourceError::Patch(_) => ErrorKind::PatchError,
        SourceError::Io(_) => ErrorKind::Io,
      },
      Self::Build(e) => match e {
        BuildError::Tool(_) => ErrorKind::ToolInvocationError,
        BuildError::Patch(_) => ErrorKind::PatchError,
        BuildError::Deps(e) => deps_kind(e),
        BuildError::Option(e) => option_kind(e),
        BuildError::MissingArtifact { .. } => ErrorKind::MissingArtifact,
        BuildError::Template(_) | BuildError::Environment { .. } | BuildError::Manifest(_) => ErrorKind::Configuration,
        BuildError::Io(_) => ErrorKind::Io,
      },
      Self::Profile(_) | Self::Manifest(_) | Self::Hash(_) => ErrorKind::Configuration,
      Self::Io(_) => ErrorKind::Io,
    }
  }
}
