use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::os::Os;

/// Compiler families a recipe distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerKind {
  Gcc,
  Clang,
  AppleClang,
  Msvc,
}

impl CompilerKind {
  /// The compiler a host uses when a profile does not name one
  pub fn default_for(os: Os) -> Self {
    match os {
      Os::Linux => Self::Gcc,
      Os::MacOs => Self::AppleClang,
      Os::Windows => Self::Msvc,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Gcc => "gcc",
      Self::Clang => "clang",
      Self::AppleClang => "apple-clang",
      Self::Msvc => "msvc",
    }
  }

  /// GCC proper; clang variants are excluded
  pub fn is_gcc_family(&self) -> bool {
    matches!(self, Self::Gcc)
  }
}

impl fmt::Display for CompilerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for CompilerKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "gcc" => Ok(Self::Gcc),
      "clang" => Ok(Self::Clang),
      "apple-clang" | "apple_clang" => Ok(Self::AppleClang),
      "msvc" | "visual studio" => Ok(Self::Msvc),
      other => Err(format!("unknown compiler '{other}'")),
    }
  }
}

/// MSVC C runtime linkage flag (`-MD`, `-MT`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Runtime {
  MD,
  MT,
  MDd,
  MTd,
}

impl Runtime {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MD => "MD",
      Self::MT => "MT",
      Self::MDd => "MDd",
      Self::MTd => "MTd",
    }
  }

  /// Dynamic runtime matching the build type
  pub fn default_for(build_type: BuildType) -> Self {
    match build_type {
      BuildType::Debug => Self::MDd,
      BuildType::Release => Self::MD,
    }
  }
}

impl fmt::Display for Runtime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Runtime {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "MD" => Ok(Self::MD),
      "MT" => Ok(Self::MT),
      "MDd" => Ok(Self::MDd),
      "MTd" => Ok(Self::MTd),
      other => Err(format!("unknown runtime '{other}'")),
    }
  }
}

/// Debug or release build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
  Debug,
  #[default]
  Release,
}

impl BuildType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Debug => "debug",
      Self::Release => "release",
    }
  }
}

impl fmt::Display for BuildType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for BuildType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "debug" => Ok(Self::Debug),
      "release" => Ok(Self::Release),
      other => Err(format!("unknown build type '{other}'")),
    }
  }
}

/// Compiler identity, optional version and, for MSVC, the runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compiler {
  pub kind: CompilerKind,
  pub version: Option<String>,
  pub runtime: Option<Runtime>,
}

impl Compiler {
  pub fn new(kind: CompilerKind) -> Self {
    Self {
      kind,
      version: None,
      runtime: None,
    }
  }

  pub fn with_version(mut self, version: &str) -> Self {
    self.version = Some(version.to_string());
    self
  }

  pub fn with_runtime(mut self, runtime: Runtime) -> Self {
    self.runtime = Some(runtime);
    self
  }

  pub fn is_msvc(&self) -> bool {
    matches!(self.kind, CompilerKind::Msvc)
  }
}

impl fmt::Display for Compiler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(version) => write!(f, "{} {}", self.kind, version),
      None => write!(f, "{}", self.kind),
    }
  }
}
