use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architectures a recipe can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
  X86,
  #[serde(rename = "x86_64")]
  X86_64,
  #[serde(alias = "armv8")]
  Aarch64,
}

impl Arch {
  /// Detect the current CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86" => Some(Self::X86),
      "x86_64" => Some(Self::X86_64),
      "aarch64" => Some(Self::Aarch64),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "aarch64",
    }
  }

  /// Argument passed to `vcvarsall.bat` to select a host/target toolset
  pub fn vcvars_arg(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X86_64 => "amd64",
      Self::Aarch64 => "amd64_arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "x86" | "i686" => Ok(Self::X86),
      "x86_64" | "amd64" => Ok(Self::X86_64),
      "aarch64" | "armv8" | "arm64" => Ok(Self::Aarch64),
      other => Err(format!("unknown arch '{other}'")),
    }
  }
}
