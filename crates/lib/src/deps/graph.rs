use std::collections::BTreeSet;
use std::fmt;

use semver::{Comparator, Op, Version, VersionReq};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::DepsError;
use crate::options::{PlatformPredicate, ResolvedConfig};

/// Version requirement carried by a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionConstraint {
  /// At least this version; caret-compatible upgrades satisfy it.
  Minimum(Version),
  /// Provided by the host system, not versioned by the package manager.
  System,
}

impl VersionConstraint {
  pub fn minimum(major: u64, minor: u64, patch: u64) -> Self {
    Self::Minimum(Version::new(major, minor, patch))
  }

  /// Combine two constraints, or `None` when no single version satisfies both.
  fn merge(&self, other: &VersionConstraint) -> Option<VersionConstraint> {
    match (self, other) {
      (Self::System, Self::System) => Some(Self::System),
      (Self::Minimum(a), Self::Minimum(b)) => {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        caret(low).matches(high).then(|| Self::Minimum(high.clone()))
      }
      _ => None,
    }
  }
}

fn caret(version: &Version) -> VersionReq {
  VersionReq {
    comparators: vec![Comparator {
      op: Op::Caret,
      major: version.major,
      minor: Some(version.minor),
      patch: Some(version.patch),
      pre: version.pre.clone(),
    }],
  }
}

impl fmt::Display for VersionConstraint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Minimum(v) => write!(f, "{v}"),
      Self::System => write!(f, "system"),
    }
  }
}

/// A required upstream component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
  pub name: String,
  pub version: VersionConstraint,
  /// Sub-variants the component must be built with.
  pub features: BTreeSet<String>,
}

impl DependencySpec {
  pub fn new(name: &str, version: VersionConstraint) -> Self {
    Self {
      name: name.to_string(),
      version,
      features: BTreeSet::new(),
    }
  }

  pub fn with_feature(mut self, feature: &str) -> Self {
    self.features.insert(feature.to_string());
    self
  }

  /// `name/version` reference handed to the package manager.
  pub fn reference(&self) -> String {
    format!("{}/{}", self.name, self.version)
  }

  pub fn is_system(&self) -> bool {
    matches!(self.version, VersionConstraint::System)
  }
}

impl fmt::Display for DependencySpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.reference())?;
    if !self.features.is_empty() {
      let features: Vec<&str> = self.features.iter().map(String::as_str).collect();
      write!(f, " [{}]", features.join(", "))?;
    }
    Ok(())
  }
}

/// When a rule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
  Always,
  /// At least one of the named options is enabled (and present on the platform).
  AnyEnabled(Vec<String>),
}

impl Condition {
  pub fn any_enabled(options: &[&str]) -> Self {
    Self::AnyEnabled(options.iter().map(|o| o.to_string()).collect())
  }

  fn holds(&self, config: &ResolvedConfig) -> bool {
    match self {
      Self::Always => true,
      Self::AnyEnabled(options) => options.iter().any(|o| config.is_enabled(o)),
    }
  }

  pub fn is_always(&self) -> bool {
    matches!(self, Self::Always)
  }
}

/// A recipe's declaration of one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRule {
  pub name: String,
  pub version: VersionConstraint,
  pub condition: Condition,
  /// Features requested from the dependency, each under its own condition.
  pub features: Vec<(String, Condition)>,
}

impl DependencyRule {
  pub fn core(name: &str, version: VersionConstraint) -> Self {
    Self {
      name: name.to_string(),
      version,
      condition: Condition::Always,
      features: Vec::new(),
    }
  }

  pub fn optional(name: &str, version: VersionConstraint, condition: Condition) -> Self {
    Self {
      name: name.to_string(),
      version,
      condition,
      features: Vec::new(),
    }
  }

  pub fn feature(mut self, feature: &str, when: Condition) -> Self {
    self.features.push((feature.to_string(), when));
    self
  }

  fn to_spec(&self, config: &ResolvedConfig) -> DependencySpec {
    let mut spec = DependencySpec::new(&self.name, self.version.clone());
    for (feature, when) in &self.features {
      if when.holds(config) {
        spec.features.insert(feature.clone());
      }
    }
    spec
  }
}

/// A build tool needed on the build machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRule {
  pub spec: DependencySpec,
  pub when: PlatformPredicate,
}

/// Ordered dependency set for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
  requires: Vec<DependencySpec>,
  tool_requires: Vec<DependencySpec>,
}

impl DependencyGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a requirement, merging with an existing one for the same component.
  ///
  /// The first requirement fixes the component's position in link order.
  pub fn require(&mut self, spec: DependencySpec) -> Result<(), DepsError> {
    merge_into(&mut self.requires, spec)
  }

  pub fn tool_require(&mut self, spec: DependencySpec) -> Result<(), DepsError> {
    merge_into(&mut self.tool_requires, spec)
  }

  pub fn requires(&self) -> &[DependencySpec] {
    &self.requires
  }

  pub fn tool_requires(&self) -> &[DependencySpec] {
    &self.tool_requires
  }

  pub fn get(&self, name: &str) -> Option<&DependencySpec> {
    self.requires.iter().find(|d| d.name == name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  pub fn names(&self) -> Vec<&str> {
    self.requires.iter().map(|d| d.name.as_str()).collect()
  }
}

fn merge_into(list: &mut Vec<DependencySpec>, spec: DependencySpec) -> Result<(), DepsError> {
  let Some(existing) = list.iter_mut().find(|d| d.name == spec.name) else {
    debug!(dependency = %spec, "adding requirement");
    list.push(spec);
    return Ok(());
  };

  let merged = existing
    .version
    .merge(&spec.version)
    .ok_or_else(|| DepsError::DependencyConflict {
      name: spec.name.clone(),
      existing: existing.reference(),
      requested: spec.reference(),
    })?;
  existing.version = merged;
  existing.features.extend(spec.features);
  debug!(dependency = %existing, "merged requirement");
  Ok(())
}

/// Build the dependency graph for `config`.
///
/// Core rules (those with [`Condition::Always`]) are applied in a first pass,
/// conditional rules in a second, each in declaration order.
pub fn build_graph(
  rules: &[DependencyRule],
  tools: &[ToolRule],
  config: &ResolvedConfig,
) -> Result<DependencyGraph, DepsError> {
  let mut graph = DependencyGraph::new();

  for rule in rules.iter().filter(|r| r.condition.is_always()) {
    graph.require(rule.to_spec(config))?;
  }
  for rule in rules.iter().filter(|r| !r.condition.is_always()) {
    if rule.condition.holds(config) {
      graph.require(rule.to_spec(config))?;
    } else {
      debug!(dependency = %rule.name, "condition not met, skipping");
    }
  }
  for tool in tools.iter().filter(|t| t.when.matches(config.platform())) {
    graph.tool_require(tool.spec.clone())?;
  }

  info!(requires = ?graph.names(), tools = graph.tool_requires.len(), "dependency graph built");
  Ok(graph)
}
