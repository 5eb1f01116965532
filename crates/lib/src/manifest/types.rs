use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ManifestError, manifest_path};
use crate::options::LinkMode;
use crate::util::hash::Hashable;

/// One installed library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
  /// Canonical link name (`cairo`), identical for static and shared builds.
  pub name: String,
  pub link: LinkMode,
  /// Link-time file, relative to the package root.
  pub file: PathBuf,
  /// Runtime file (DLL), when the platform separates it from the import library.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub runtime: Option<PathBuf>,
}

/// Installed files and link metadata for one package.
///
/// ```json
/// {
///   "name": "cairo",
///   "version": "1.15.14",
///   "platform": "x86_64-windows",
///   "headers": { "cairo": ["include/cairo/cairo.h", ...] },
///   "libraries": [{ "name": "cairo", "link": "static", "file": "lib/cairo.lib" }],
///   "defines": ["CAIRO_WIN32_STATIC_BUILD=1"],
///   "system_libs": ["gdi32", "msimg32", "user32"],
///   ...
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
  pub name: String,
  pub version: String,
  pub platform: String,
  /// Installed headers grouped by include namespace.
  pub headers: BTreeMap<String, Vec<PathBuf>>,
  /// Libraries in link order.
  pub libraries: Vec<LibraryEntry>,
  pub defines: Vec<String>,
  pub system_libs: Vec<String>,
  #[serde(default)]
  pub frameworks: Vec<String>,
  pub include_dirs: Vec<PathBuf>,
  pub lib_dirs: Vec<PathBuf>,
  #[serde(default)]
  pub bin_dirs: Vec<PathBuf>,
  #[serde(default)]
  pub pkgconfig: Vec<PathBuf>,
  #[serde(default)]
  pub licenses: Vec<PathBuf>,
}

impl Hashable for ArtifactManifest {}

impl ArtifactManifest {
  pub fn new(name: &str, version: &str, platform: &str) -> Self {
    Self {
      name: name.to_string(),
      version: version.to_string(),
      platform: platform.to_string(),
      ..Default::default()
    }
  }

  pub fn add_header(&mut self, namespace: &str, path: PathBuf) {
    let headers = self.headers.entry(namespace.to_string()).or_default();
    if !headers.contains(&path) {
      headers.push(path);
      headers.sort();
    }
  }

  pub fn library(&self, name: &str) -> Option<&LibraryEntry> {
    self.libraries.iter().find(|l| l.name == name)
  }

  /// Link names in order.
  pub fn library_names(&self) -> Vec<&str> {
    self.libraries.iter().map(|l| l.name.as_str()).collect()
  }

  pub fn header_count(&self) -> usize {
    self.headers.values().map(Vec::len).sum()
  }

  /// Write to `package_dir/cairokit-manifest.json`.
  pub fn write(&self, package_dir: &Path) -> Result<PathBuf, ManifestError> {
    let path = manifest_path(package_dir);
    let json = serde_json::to_string_pretty(self)?;
    std::fs::write(&path, format!("{json}\n"))?;
    info!(path = ?path, "wrote manifest");
    Ok(path)
  }

  /// Read the manifest of a package directory.
  pub fn read(package_dir: &Path) -> Result<Self, ManifestError> {
    let path = manifest_path(package_dir);
    if !path.exists() {
      return Err(ManifestError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_json::from_str(&contents).map_err(|source| ManifestError::Parse { path, source })
  }
}

impl fmt::Display for ArtifactManifest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}/{} ({})", self.name, self.version, self.platform)?;
    for lib in &self.libraries {
      writeln!(f, "  lib      {} ({}) {}", lib.name, lib.link, lib.file.display())?;
    }
    for (namespace, headers) in &self.headers {
      writeln!(f, "  headers  {namespace}: {} files", headers.len())?;
    }
    if !self.defines.is_empty() {
      writeln!(f, "  defines  {}", self.defines.join(" "))?;
    }
    if !self.system_libs.is_empty() {
      writeln!(f, "  system   {}", self.system_libs.join(" "))?;
    }
    if !self.frameworks.is_empty() {
      writeln!(f, "  frameworks {}", self.frameworks.join(" "))?;
    }
    Ok(())
  }
}
