use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::OptionError;
use super::schema::{OptionSchema, OptionValue};
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::compiler::{BuildType, Compiler};
use crate::platform::os::Os;
use crate::util::hash::Hashable;

/// Raw user overrides, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides(BTreeMap<String, String>);

impl Overrides {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse `name=value` pairs as given on the command line.
  pub fn parse_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self, OptionError> {
    let mut overrides = Self::new();
    for pair in pairs {
      let pair = pair.as_ref();
      let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| OptionError::invalid(pair, "expected name=value"))?;
      let name = name.trim();
      if name.is_empty() {
        return Err(OptionError::invalid(pair, "empty option name"));
      }
      overrides.insert(name, value.trim());
    }
    Ok(overrides)
  }

  pub fn insert(&mut self, name: &str, value: &str) {
    self.0.insert(name.to_string(), value.to_string());
  }

  /// Merge `other` into `self`; values in `other` win.
  pub fn merge(mut self, other: Overrides) -> Self {
    self.0.extend(other.0);
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Static or shared linkage of the produced library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
  Static,
  Shared,
}

impl fmt::Display for LinkMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Static => write!(f, "static"),
      Self::Shared => write!(f, "shared"),
    }
  }
}

/// A complete, immutable configuration for one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
  platform: Platform,
  values: BTreeMap<String, OptionValue>,
  pruned: BTreeSet<String>,
}

impl Hashable for ResolvedConfig {}

impl ResolvedConfig {
  /// Read an option. Pruned options are `UnsupportedOption`, unknown ones `InvalidOption`.
  pub fn get(&self, name: &str) -> Result<&OptionValue, OptionError> {
    if let Some(value) = self.values.get(name) {
      return Ok(value);
    }
    if self.pruned.contains(name) {
      return Err(OptionError::UnsupportedOption {
        name: name.to_string(),
        platform: self.platform.triple(),
      });
    }
    Err(OptionError::invalid(name, "unknown option"))
  }

  /// Read a boolean option.
  pub fn flag(&self, name: &str) -> Result<bool, OptionError> {
    self
      .get(name)?
      .as_bool()
      .ok_or_else(|| OptionError::invalid(name, "not a boolean option"))
  }

  /// True only when the option exists on this platform and is set to `true`.
  pub fn is_enabled(&self, name: &str) -> bool {
    matches!(self.flag(name), Ok(true))
  }

  pub fn is_pruned(&self, name: &str) -> bool {
    self.pruned.contains(name)
  }

  pub fn link_mode(&self) -> LinkMode {
    if self.is_enabled("shared") {
      LinkMode::Shared
    } else {
      LinkMode::Static
    }
  }

  pub fn platform(&self) -> &Platform {
    &self.platform
  }

  pub fn os(&self) -> Os {
    self.platform.os
  }

  pub fn arch(&self) -> Arch {
    self.platform.arch
  }

  pub fn compiler(&self) -> &Compiler {
    &self.platform.compiler
  }

  pub fn build_type(&self) -> BuildType {
    self.platform.build_type
  }

  pub fn values(&self) -> &BTreeMap<String, OptionValue> {
    &self.values
  }

  pub fn pruned(&self) -> &BTreeSet<String> {
    &self.pruned
  }
}

/// Resolve `schema` for `platform`, applying `overrides`.
///
/// Options unavailable on the platform are pruned; every remaining option gets
/// its platform default unless overridden. Overrides naming an unknown or
/// pruned option, or carrying a value outside the option's domain, fail with
/// `InvalidOption`.
pub fn resolve(schema: &OptionSchema, platform: &Platform, overrides: &Overrides) -> Result<ResolvedConfig, OptionError> {
  let pruned_schema = schema.prune(platform);

  for (name, _) in overrides.iter() {
    if pruned_schema.pruned.contains(name) {
      return Err(OptionError::invalid(
        name,
        format!("not available on {}", platform.triple()),
      ));
    }
    if !pruned_schema.available.contains_key(name) {
      return Err(OptionError::invalid(name, "unknown option"));
    }
  }

  let mut values = BTreeMap::new();
  for (name, decl) in &pruned_schema.available {
    let value = match overrides.0.get(name) {
      Some(raw) => decl.domain.parse(raw).ok_or_else(|| {
        OptionError::invalid(name, format!("'{raw}' is not one of {}", decl.domain.describe()))
      })?,
      None => decl.default_for(platform).clone(),
    };
    debug!(option = %name, value = %value, "resolved option");
    values.insert(name.clone(), value);
  }

  Ok(ResolvedConfig {
    platform: platform.clone(),
    values,
    pruned: pruned_schema.pruned,
  })
}
