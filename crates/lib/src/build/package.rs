//! Packaging: copy build outputs into the package tree under canonical names
//! and describe them in an [`ArtifactManifest`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{BuildContext, BuildError, BuildOutputs, pkgconfig};
use crate::consts::{INCLUDE_NAMESPACE, PACKAGE_NAME};
use crate::manifest::{ArtifactManifest, LibraryEntry};
use crate::recipe::{self, LICENSE_PATTERNS};

const STATIC_SUFFIX: &str = "-static";

/// Drop a `-static` marker from a library file name:
/// `cairo-static.lib` becomes `cairo.lib`, `libcairo-static.a` becomes `libcairo.a`.
pub fn canonical_file_name(file_name: &str) -> String {
  match file_name.find(&format!("{STATIC_SUFFIX}.")) {
    Some(pos) => format!("{}{}", &file_name[..pos], &file_name[pos + STATIC_SUFFIX.len()..]),
    None => file_name.to_string(),
  }
}

/// Link name of a library file, or `None` for files that are not linked
/// against directly (libtool archives, versioned shared objects).
///
/// `libcairo.so` and `cairo.lib` are both `cairo`.
pub fn link_name(file_name: &str) -> Option<String> {
  let canonical = canonical_file_name(file_name);
  let (stem, unix_prefixed) = if let Some(stem) = canonical.strip_suffix(".dll.a") {
    (stem, true)
  } else if let Some(stem) = canonical.strip_suffix(".lib") {
    (stem, false)
  } else if let Some(stem) = canonical.strip_suffix(".a") {
    (stem, true)
  } else if let Some(stem) = canonical.strip_suffix(".so") {
    (stem, true)
  } else if let Some(stem) = canonical.strip_suffix(".dylib") {
    // `libcairo.2.dylib` is the versioned install name.
    if stem.contains('.') {
      return None;
    }
    (stem, true)
  } else {
    return None;
  };

  let name = if unix_prefixed {
    stem.strip_prefix("lib").unwrap_or(stem)
  } else {
    stem
  };
  (!name.is_empty()).then(|| name.to_string())
}

/// `cairo.dll` and `libcairo-2.dll` both serve `cairo`.
fn runtime_serves(file_name: &str, name: &str) -> bool {
  let Some(stem) = file_name.strip_suffix(".dll") else {
    return false;
  };
  let stem = stem.strip_prefix("lib").unwrap_or(stem);
  if stem == name {
    return true;
  }
  stem
    .strip_prefix(name)
    .and_then(|rest| rest.strip_prefix('-'))
    .is_some_and(|version| !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()))
}

fn file_name(path: &Path) -> Result<String, BuildError> {
  path
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .ok_or_else(|| BuildError::MissingArtifact {
      what: "file name".to_string(),
      searched: path.to_path_buf(),
    })
}

/// Copy a file, recreating symlinks (pointing at canonical names) as symlinks.
#[cfg(unix)]
fn copy_entry(src: &Path, dest: &Path) -> std::io::Result<()> {
  if src.is_symlink() {
    let target = std::fs::read_link(src)?;
    let canonical = match target.file_name() {
      Some(name) => PathBuf::from(canonical_file_name(&name.to_string_lossy())),
      None => target,
    };
    return std::os::unix::fs::symlink(canonical, dest);
  }
  std::fs::copy(src, dest).map(|_| ())
}

#[cfg(not(unix))]
fn copy_entry(src: &Path, dest: &Path) -> std::io::Result<()> {
  std::fs::copy(src, dest).map(|_| ())
}

fn licenses(source_root: &Path) -> Result<Vec<PathBuf>, BuildError> {
  let mut found = Vec::new();
  for entry in std::fs::read_dir(source_root)? {
    let entry = entry?;
    let name = entry.file_name().to_string_lossy().to_string();
    if entry.file_type()?.is_file() && LICENSE_PATTERNS.iter().any(|p| name.starts_with(p)) {
      found.push(entry.path());
    }
  }
  found.sort();
  Ok(found)
}

/// Lay out the package tree and write its manifest.
///
/// The tree is assembled next to the package directory and moved into place
/// only once its manifest is written; on any error nothing is left at either
/// location. Every expected library must be present.
pub fn package(ctx: &BuildContext<'_>, outputs: &BuildOutputs) -> Result<ArtifactManifest, BuildError> {
  let dir = ctx.layout.package_dir();
  let staging = ctx.layout.package_staging_dir();
  ctx.layout.discard_package()?;

  let result = assemble(ctx, outputs, &staging, &dir).and_then(|manifest| {
    std::fs::rename(&staging, &dir)?;
    Ok(manifest)
  });
  match result {
    Ok(manifest) => {
      info!(dir = ?dir, headers = manifest.header_count(), "packaged");
      Ok(manifest)
    }
    Err(err) => {
      if staging.exists() {
        if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
          warn!(dir = ?staging, error = %cleanup, "could not remove partial package");
        }
      }
      Err(err)
    }
  }
}

/// Copy everything into `dir`; `.pc` prefixes point at `final_dir`.
fn assemble(
  ctx: &BuildContext<'_>,
  outputs: &BuildOutputs,
  dir: &Path,
  final_dir: &Path,
) -> Result<ArtifactManifest, BuildError> {
  let config = ctx.config;
  let os = config.os();

  let include_rel = PathBuf::from("include").join(INCLUDE_NAMESPACE);
  let include_dir = dir.join(&include_rel);
  let lib_dir = dir.join("lib");
  let bin_dir = dir.join("bin");
  let pc_dir = lib_dir.join("pkgconfig");
  let license_dir = dir.join("licenses");
  for d in [&include_dir, &lib_dir, &pc_dir, &license_dir] {
    std::fs::create_dir_all(d)?;
  }

  let mut manifest = ArtifactManifest::new(PACKAGE_NAME, &ctx.source.version, &config.platform().triple());

  for header in &outputs.headers {
    let name = file_name(header)?;
    std::fs::copy(header, include_dir.join(&name))?;
    manifest.add_header(INCLUDE_NAMESPACE, include_rel.join(&name));
  }

  let mut linkable: Vec<(String, PathBuf)> = Vec::new();
  for library in &outputs.libraries {
    let name = canonical_file_name(&file_name(library)?);
    copy_entry(library, &lib_dir.join(&name))?;
    debug!(from = ?library, to = %name, "packaged library");
    if let Some(link) = link_name(&name) {
      linkable.push((link, PathBuf::from("lib").join(&name)));
    }
  }

  let mut runtimes = Vec::new();
  if !outputs.runtimes.is_empty() {
    std::fs::create_dir_all(&bin_dir)?;
    manifest.bin_dirs.push(PathBuf::from("bin"));
  }
  for runtime in &outputs.runtimes {
    let name = file_name(runtime)?;
    std::fs::copy(runtime, bin_dir.join(&name))?;
    runtimes.push(name);
  }

  for expected in recipe::libraries(config) {
    let file = linkable
      .iter()
      .find(|(link, _)| link == expected)
      .map(|(_, file)| file.clone())
      .ok_or_else(|| BuildError::MissingArtifact {
        what: format!("library {expected}"),
        searched: lib_dir.clone(),
      })?;
    let runtime = runtimes
      .iter()
      .find(|r| runtime_serves(r, expected))
      .map(|r| PathBuf::from("bin").join(r));
    manifest.libraries.push(LibraryEntry {
      name: expected.to_string(),
      link: config.link_mode(),
      file,
      runtime,
    });
  }

  let prefix = pkgconfig::tool_path(final_dir, config.platform());
  for pc in &outputs.pkgconfig {
    let written = pkgconfig::copy_with_prefix(pc, &pc_dir, &prefix)?;
    manifest.pkgconfig.push(PathBuf::from("lib/pkgconfig").join(file_name(&written)?));
  }

  for license in licenses(&ctx.source.root)? {
    let name = file_name(&license)?;
    std::fs::copy(&license, license_dir.join(&name))?;
    manifest.licenses.push(PathBuf::from("licenses").join(name));
  }

  manifest.defines = recipe::defines(config);
  manifest.system_libs = recipe::system_libs(os).iter().map(|s| s.to_string()).collect();
  manifest.frameworks = recipe::frameworks(os).iter().map(|s| s.to_string()).collect();
  manifest.include_dirs = vec![PathBuf::from("include"), include_rel];
  manifest.lib_dirs = vec![PathBuf::from("lib")];

  manifest.write(dir)?;
  Ok(manifest)
}
