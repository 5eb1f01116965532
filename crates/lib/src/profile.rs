//! TOML profiles.
//!
//! A profile pins everything one invocation needs: target settings, option
//! values, where the source comes from, tool overrides and the install roots
//! of already-resolved dependencies.
//!
//! ```toml
//! [settings]
//! os = "windows"
//! arch = "x86_64"
//! compiler = "msvc"
//! build_type = "release"
//! runtime = "MT"
//!
//! [options]
//! shared = false
//! enable_glib = false
//!
//! [source]
//! version = "1.15.14"
//! sha256 = "16566b6c015a761bb0b7595cf879b77f8de85f90b443119083c4c2769b93298d"
//!
//! [[source.patches]]
//! diff = "patches/fix-win32-build.diff"
//!
//! [tools]
//! jobs = 8
//!
//! [deps.zlib]
//! root = "C:/deps/zlib"
//! libs = ["zlib"]
//! ```
//!
//! Relative paths are resolved against the profile's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_BASE_URL, DEFAULT_VERSION};
use crate::deps::{InstalledDep, InstalledDeps};
use crate::execute::ToolPaths;
use crate::options::{Overrides, ResolvedConfig};
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::compiler::{BuildType, Compiler, CompilerKind, Runtime};
use crate::platform::os::Os;
use crate::recipe::Recipe;
use crate::source::{PatchOp, PatchSet, SourceLocation, SourceRequest};

#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid profile {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("invalid value for '{key}': {message}")]
  InvalidValue { key: String, message: String },

  #[error("cannot detect the host platform; set settings.os and settings.arch")]
  UnknownHost,
}

/// Target settings; unset fields fall back to the detected host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  pub os: Option<Os>,
  pub arch: Option<Arch>,
  pub compiler: Option<CompilerKind>,
  pub compiler_version: Option<String>,
  pub build_type: Option<BuildType>,
  pub runtime: Option<Runtime>,
}

/// A user patch: a diff file, or a literal replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatchEntry {
  Diff {
    diff: PathBuf,
    #[serde(default = "default_strip")]
    strip: u32,
  },
  Replace {
    file: PathBuf,
    search: String,
    replace: String,
  },
}

fn default_strip() -> u32 {
  1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
  pub version: Option<String>,
  pub base_url: Option<String>,
  /// Local archive used instead of downloading.
  pub archive: Option<PathBuf>,
  pub sha256: Option<String>,
  pub patches: Vec<PatchEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
  pub settings: Settings,
  pub options: BTreeMap<String, toml::Value>,
  pub source: SourceSettings,
  pub tools: ToolPaths,
  pub deps: BTreeMap<String, InstalledDep>,
  /// Directory relative paths are resolved against.
  #[serde(skip)]
  pub base_dir: PathBuf,
}

impl Profile {
  pub fn load(path: &Path) -> Result<Self, ProfileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let profile = Self::parse(&text, &base_dir).map_err(|e| match e {
      ProfileError::Parse { message, .. } => ProfileError::Parse {
        path: path.to_path_buf(),
        message,
      },
      other => other,
    })?;
    debug!(path = ?path, options = profile.options.len(), deps = profile.deps.len(), "loaded profile");
    Ok(profile)
  }

  pub fn parse(text: &str, base_dir: &Path) -> Result<Self, ProfileError> {
    let mut profile: Profile = toml::from_str(text).map_err(|e| ProfileError::Parse {
      path: PathBuf::from("<profile>"),
      message: e.to_string(),
    })?;
    profile.base_dir = base_dir.to_path_buf();
    Ok(profile)
  }

  fn resolve_path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.base_dir.join(path)
    }
  }

  /// Target platform: profile settings over the detected host.
  pub fn platform(&self) -> Result<Platform, ProfileError> {
    let s = &self.settings;
    let (os, arch) = match (s.os, s.arch) {
      (Some(os), Some(arch)) => (os, arch),
      (os, arch) => {
        let host = Platform::current().ok_or(ProfileError::UnknownHost)?;
        (os.unwrap_or(host.os), arch.unwrap_or(host.arch))
      }
    };

    let mut compiler = Compiler::new(s.compiler.unwrap_or_else(|| CompilerKind::default_for(os)));
    if let Some(version) = &s.compiler_version {
      compiler = compiler.with_version(version);
    }
    if let Some(runtime) = s.runtime {
      if !compiler.is_msvc() {
        return Err(ProfileError::InvalidValue {
          key: "settings.runtime".to_string(),
          message: format!("only meaningful for msvc, not {}", compiler.kind),
        });
      }
      compiler = compiler.with_runtime(runtime);
    }

    Ok(
      Platform::new(arch, os)
        .with_compiler(compiler)
        .with_build_type(s.build_type.unwrap_or_default()),
    )
  }

  /// `[options]` as raw override strings.
  pub fn overrides(&self) -> Result<Overrides, ProfileError> {
    let mut overrides = Overrides::new();
    for (name, value) in &self.options {
      let raw = match value {
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        other => {
          return Err(ProfileError::InvalidValue {
            key: format!("options.{name}"),
            message: format!("expected a boolean or string, got {}", other.type_str()),
          });
        }
      };
      overrides.insert(name, &raw);
    }
    Ok(overrides)
  }

  pub fn version(&self) -> &str {
    self.source.version.as_deref().unwrap_or(DEFAULT_VERSION)
  }

  pub fn location(&self) -> SourceLocation {
    let sha256 = self.source.sha256.clone();
    match &self.source.archive {
      Some(archive) => SourceLocation::Local {
        path: self.resolve_path(archive),
        sha256,
      },
      None => SourceLocation::release(
        self.source.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        self.version(),
        sha256,
      ),
    }
  }

  /// User patches, diff files read eagerly.
  pub fn patches(&self) -> Result<PatchSet, ProfileError> {
    let mut patches = PatchSet::new();
    for entry in &self.source.patches {
      let op = match entry {
        PatchEntry::Diff { diff, strip } => {
          let path = self.resolve_path(diff);
          let contents = std::fs::read_to_string(&path).map_err(|source| ProfileError::Read {
            path: path.clone(),
            source,
          })?;
          let name = diff.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
          PatchOp::Diff {
            name,
            contents,
            strip: *strip,
          }
        }
        PatchEntry::Replace { file, search, replace } => PatchOp::replace(file.clone(), search, replace),
      };
      patches.push(op);
    }
    Ok(patches)
  }

  /// Source request: the recipe's patches for `config`, then the profile's.
  pub fn source_request(&self, recipe: &Recipe, config: &ResolvedConfig) -> Result<SourceRequest, ProfileError> {
    let mut patches = recipe.source_patches(config);
    patches.extend(self.patches()?);
    Ok(SourceRequest {
      version: self.version().to_string(),
      location: self.location(),
      patches,
    })
  }

  /// Dependency install roots, relative roots resolved.
  pub fn installed(&self) -> InstalledDeps {
    let mut deps = InstalledDeps::new();
    for (name, dep) in &self.deps {
      let mut dep = dep.clone();
      dep.root = self.resolve_path(&dep.root);
      deps.insert(name, dep);
    }
    deps
  }
}
