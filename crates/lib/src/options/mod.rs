//! Option resolution.
//!
//! A recipe declares its options in an [`OptionSchema`]: each option has a
//! domain, a default (possibly different on some platforms) and an
//! availability predicate. [`resolve`] prunes the options a platform does not
//! support, applies user overrides and returns an immutable [`ResolvedConfig`]
//! that every later stage reads from.

mod resolve;
mod schema;

pub use resolve::*;
pub use schema::*;

use thiserror::Error;

/// Errors raised while resolving or reading options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
  /// Unknown option, pruned option in an override, or a value outside the domain.
  #[error("invalid option '{name}': {reason}")]
  InvalidOption { name: String, reason: String },

  /// The option exists in the schema but not on this platform.
  #[error("option '{name}' is not supported on {platform}")]
  UnsupportedOption { name: String, platform: String },
}

impl OptionError {
  pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
    Self::InvalidOption {
      name: name.to_string(),
      reason: reason.into(),
    }
  }
}
