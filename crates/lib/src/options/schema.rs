use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::platform::compiler::CompilerKind;
use crate::platform::os::Os;

/// A concrete option value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
  Bool(bool),
  Choice(String),
}

impl OptionValue {
  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      Self::Choice(_) => None,
    }
  }
}

impl fmt::Display for OptionValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bool(b) => write!(f, "{b}"),
      Self::Choice(s) => write!(f, "{s}"),
    }
  }
}

impl From<bool> for OptionValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<&str> for OptionValue {
  fn from(value: &str) -> Self {
    Self::Choice(value.to_string())
  }
}

/// The set of values an option accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionDomain {
  Bool,
  Choice(Vec<String>),
}

impl OptionDomain {
  pub fn contains(&self, value: &OptionValue) -> bool {
    match (self, value) {
      (Self::Bool, OptionValue::Bool(_)) => true,
      (Self::Choice(choices), OptionValue::Choice(v)) => choices.iter().any(|c| c == v),
      _ => false,
    }
  }

  /// Parse a raw override string into a value of this domain.
  pub fn parse(&self, raw: &str) -> Option<OptionValue> {
    match self {
      Self::Bool => match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(OptionValue::Bool(true)),
        "false" | "0" | "no" | "off" => Some(OptionValue::Bool(false)),
        _ => None,
      },
      Self::Choice(choices) => choices
        .iter()
        .find(|c| c.as_str() == raw.trim())
        .map(|c| OptionValue::Choice(c.clone())),
    }
  }

  pub fn describe(&self) -> String {
    match self {
      Self::Bool => "true|false".to_string(),
      Self::Choice(choices) => choices.join("|"),
    }
  }
}

/// A predicate over platform facts, evaluated once during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformPredicate {
  Always,
  OsIn(Vec<Os>),
  OsNotIn(Vec<Os>),
  CompilerIs(CompilerKind),
  CompilerIsNot(CompilerKind),
  All(Vec<PlatformPredicate>),
}

impl PlatformPredicate {
  pub fn matches(&self, platform: &Platform) -> bool {
    match self {
      Self::Always => true,
      Self::OsIn(oses) => oses.contains(&platform.os),
      Self::OsNotIn(oses) => !oses.contains(&platform.os),
      Self::CompilerIs(kind) => platform.compiler.kind == *kind,
      Self::CompilerIsNot(kind) => platform.compiler.kind != *kind,
      Self::All(predicates) => predicates.iter().all(|p| p.matches(platform)),
    }
  }
}

/// Declaration of a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
  pub name: String,
  pub description: String,
  pub domain: OptionDomain,
  pub default: OptionValue,
  /// Platform-specific defaults; the first matching predicate wins.
  pub platform_defaults: Vec<(PlatformPredicate, OptionValue)>,
  pub available: PlatformPredicate,
}

impl OptionDecl {
  pub fn boolean(name: &str, default: bool) -> Self {
    Self {
      name: name.to_string(),
      description: String::new(),
      domain: OptionDomain::Bool,
      default: OptionValue::Bool(default),
      platform_defaults: Vec::new(),
      available: PlatformPredicate::Always,
    }
  }

  pub fn choice(name: &str, choices: &[&str], default: &str) -> Self {
    Self {
      name: name.to_string(),
      description: String::new(),
      domain: OptionDomain::Choice(choices.iter().map(|c| c.to_string()).collect()),
      default: OptionValue::Choice(default.to_string()),
      platform_defaults: Vec::new(),
      available: PlatformPredicate::Always,
    }
  }

  pub fn describe(mut self, description: &str) -> Self {
    self.description = description.to_string();
    self
  }

  pub fn available_when(mut self, predicate: PlatformPredicate) -> Self {
    self.available = predicate;
    self
  }

  pub fn default_when(mut self, predicate: PlatformPredicate, value: impl Into<OptionValue>) -> Self {
    self.platform_defaults.push((predicate, value.into()));
    self
  }

  /// The default that applies on `platform`.
  pub fn default_for(&self, platform: &Platform) -> &OptionValue {
    self
      .platform_defaults
      .iter()
      .find(|(predicate, _)| predicate.matches(platform))
      .map(|(_, value)| value)
      .unwrap_or(&self.default)
  }
}

/// Ordered set of option declarations for a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSchema {
  decls: Vec<OptionDecl>,
}

impl OptionSchema {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a declaration. A later declaration with the same name replaces the earlier one.
  pub fn declare(mut self, decl: OptionDecl) -> Self {
    match self.decls.iter_mut().find(|d| d.name == decl.name) {
      Some(existing) => *existing = decl,
      None => self.decls.push(decl),
    }
    self
  }

  pub fn get(&self, name: &str) -> Option<&OptionDecl> {
    self.decls.iter().find(|d| d.name == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &OptionDecl> {
    self.decls.iter()
  }

  pub fn len(&self) -> usize {
    self.decls.len()
  }

  pub fn is_empty(&self) -> bool {
    self.decls.is_empty()
  }

  /// Split the schema into the options available on `platform` and the names pruned from it.
  pub fn prune(&self, platform: &Platform) -> PrunedSchema<'_> {
    let mut available = BTreeMap::new();
    let mut pruned = BTreeSet::new();
    for decl in &self.decls {
      if decl.available.matches(platform) {
        available.insert(decl.name.clone(), decl);
      } else {
        pruned.insert(decl.name.clone());
      }
    }
    PrunedSchema { available, pruned }
  }
}

/// The schema as seen from one platform.
#[derive(Debug)]
pub struct PrunedSchema<'a> {
  pub available: BTreeMap<String, &'a OptionDecl>,
  pub pruned: BTreeSet<String>,
}
