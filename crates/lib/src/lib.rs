//! cairokit-lib: build-recipe orchestration for the cairo graphics library.
//!
//! A build runs four stages in order:
//! - [`options`]: resolve the option schema against the target platform
//! - [`deps`]: derive the ordered dependency graph from the resolved options
//! - [`source`]: fetch, extract and patch the upstream source tree
//! - [`build`]: run the toolchain-specific strategy and package the result,
//!   described by a [`manifest::ArtifactManifest`]
//!
//! [`pipeline::Pipeline`] strings the stages together from a [`profile::Profile`].

pub mod build;
pub mod consts;
pub mod deps;
pub mod error;
pub mod execute;
pub mod manifest;
pub mod options;
pub mod pipeline;
pub mod platform;
pub mod profile;
pub mod recipe;
pub mod source;
pub mod template;
pub mod util;

pub use error::{ErrorKind, RecipeError};
