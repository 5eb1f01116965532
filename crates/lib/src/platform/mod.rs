pub mod arch;
pub mod compiler;
pub mod os;
pub mod paths;

use arch::Arch;
use compiler::{BuildType, Compiler, CompilerKind};
use os::Os;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything a recipe knows about the machine it builds for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
  pub compiler: Compiler,
  pub build_type: BuildType,
}

impl Platform {
  /// Create a platform with the OS's default compiler and a release build
  pub fn new(arch: Arch, os: Os) -> Self {
    Self {
      arch,
      os,
      compiler: Compiler::new(CompilerKind::default_for(os)),
      build_type: BuildType::Release,
    }
  }

  pub fn with_compiler(mut self, compiler: Compiler) -> Self {
    self.compiler = compiler;
    self
  }

  pub fn with_build_type(mut self, build_type: BuildType) -> Self {
    self.build_type = build_type;
    self
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self::new(Arch::current()?, Os::current()?))
  }

  /// Returns the platform triple string (e.g., "x86_64-linux")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({}, {})", self.triple(), self.compiler, self.build_type)
  }
}

/// Returns the platform triple for the current system (e.g., "aarch64-macos")
///
/// Returns `None` if the current platform is not supported
pub fn platform_triple() -> Option<String> {
  Platform::current().map(|p| p.triple())
}
