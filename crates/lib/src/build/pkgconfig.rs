//! pkg-config metadata: staging dependency `.pc` files for `configure` and
//! synthesizing cairo's own for the vendored makefile build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{BuildContext, BuildError};
use crate::platform::Platform;
use crate::platform::os::Os;
use crate::recipe;
use crate::template;

pub const CAIRO_PC_TEMPLATE: &str = "\
prefix=@prefix@
exec_prefix=${prefix}
libdir=${exec_prefix}/lib
includedir=${prefix}/include

Name: cairo
Description: Multi-platform 2D graphics library
Version: @VERSION@

Requires.private: @REQUIRES@
Libs: -L${libdir} -lcairo
Libs.private: @LIBS@
Cflags: -I${includedir}/cairo
";

pub const CAIRO_GOBJECT_PC_TEMPLATE: &str = "\
prefix=@prefix@
exec_prefix=${prefix}
libdir=${exec_prefix}/lib
includedir=${prefix}/include

Name: cairo-gobject
Description: gobject functions for cairo graphics library
Version: @VERSION@

Requires: cairo,glib-2.0,gobject-2.0
Libs: -L${libdir} -lcairo-gobject
Cflags: -I${includedir}/cairo
";

/// `C:\deps\zlib` as an MSYS shell sees it: `/c/deps/zlib`.
pub fn msys_path(path: &Path) -> String {
  let raw = path.display().to_string().replace('\\', "/");
  let bytes = raw.as_bytes();
  if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
    format!("/{}{}", (bytes[0] as char).to_ascii_lowercase(), &raw[2..])
  } else {
    raw
  }
}

/// `C:\pkg\cairo` with forward slashes, as native Windows pkg-config reads it.
pub fn forward_slash_path(path: &Path) -> String {
  path.display().to_string().replace('\\', "/")
}

/// Path spelled the way the toolchain expects inside `.pc` files and flags.
/// Only the MSYS shell used by non-MSVC Windows builds needs `/c/...`.
pub fn tool_path(path: &Path, platform: &Platform) -> String {
  match platform.os {
    Os::Windows if platform.compiler.is_msvc() => forward_slash_path(path),
    Os::Windows => msys_path(path),
    _ => path.display().to_string(),
  }
}

/// Replace the `prefix=` variable of a `.pc` file.
pub fn rewrite_prefix(contents: &str, prefix: &str) -> String {
  let mut out = String::with_capacity(contents.len());
  for line in contents.lines() {
    if line.starts_with("prefix=") {
      out.push_str("prefix=");
      out.push_str(prefix);
    } else {
      out.push_str(line);
    }
    out.push('\n');
  }
  out
}

fn pc_files(dir: &Path) -> Vec<PathBuf> {
  WalkDir::new(dir)
    .max_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_map(Result::ok)
    .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "pc"))
    .map(|e| e.into_path())
    .collect()
}

/// Copy `src` to `dest_dir` with its prefix pointing at `prefix`.
pub fn copy_with_prefix(src: &Path, dest_dir: &Path, prefix: &str) -> Result<PathBuf, BuildError> {
  let Some(name) = src.file_name() else {
    return Err(BuildError::MissingArtifact {
      what: "pkg-config file name".to_string(),
      searched: src.to_path_buf(),
    });
  };
  let dest = dest_dir.join(name);
  let contents = std::fs::read_to_string(src)?;
  std::fs::write(&dest, rewrite_prefix(&contents, prefix))?;
  Ok(dest)
}

/// Populate `dest` with every resolved dependency's `.pc` files, prefixes
/// rewritten to the dependency's install root.
pub fn stage_dependency_metadata(ctx: &BuildContext<'_>, dest: &Path) -> Result<Vec<PathBuf>, BuildError> {
  if dest.exists() {
    std::fs::remove_dir_all(dest)?;
  }
  std::fs::create_dir_all(dest)?;

  let platform = ctx.config.platform();
  let mut staged = Vec::new();
  for (name, dep) in ctx.deps.ordered(ctx.graph) {
    let prefix = tool_path(&dep.root, platform);
    let files: Vec<PathBuf> = dep.pkgconfig_dirs().iter().flat_map(|d| pc_files(d)).collect();
    if files.is_empty() {
      warn!(dependency = %name, root = ?dep.root, "no pkg-config metadata, skipping");
      continue;
    }
    for file in files {
      let dest_file = copy_with_prefix(&file, dest, &prefix)?;
      debug!(dependency = %name, file = ?dest_file, "staged pkg-config file");
      staged.push(dest_file);
    }
  }
  info!(dir = ?dest, files = staged.len(), "staged pkg-config metadata");
  Ok(staged)
}

/// Write `cairo.pc` (and `cairo-gobject.pc` when built) into `dest`, with
/// `@prefix@` pointing at `prefix`.
pub fn synthesize(ctx: &BuildContext<'_>, dest: &Path, prefix: &Path) -> Result<Vec<PathBuf>, BuildError> {
  std::fs::create_dir_all(dest)?;
  let platform = ctx.config.platform();
  let os = platform.os;

  let requires: Vec<&str> = ctx
    .graph
    .requires()
    .iter()
    .filter(|spec| ctx.deps.find(&spec.name).is_some())
    .filter_map(|spec| recipe::pkgconfig_module(&spec.name))
    .collect();

  let mut libs = Vec::new();
  for (name, dep) in ctx.deps.ordered(ctx.graph) {
    for dir in dep.lib_paths() {
      libs.push(format!("-L{}", tool_path(&dir, platform)));
    }
    libs.push(format!("-l{}", dep.primary_lib(name)));
  }
  libs.extend(recipe::system_libs(os).iter().map(|l| format!("-l{l}")));

  let values = BTreeMap::from([
    ("prefix".to_string(), tool_path(prefix, platform)),
    ("VERSION".to_string(), ctx.source.version.clone()),
    ("REQUIRES".to_string(), requires.join(", ")),
    ("LIBS".to_string(), libs.join(" ")),
  ]);

  let mut written = Vec::new();
  let mut emit = |name: &str, template_text: &str| -> Result<(), BuildError> {
    let path = dest.join(name);
    std::fs::write(&path, template::substitute(template_text, &values)?)?;
    debug!(file = ?path, "generated pkg-config file");
    written.push(path);
    Ok(())
  };

  emit("cairo.pc", CAIRO_PC_TEMPLATE)?;
  if ctx.config.is_enabled("enable_glib") {
    emit("cairo-gobject.pc", CAIRO_GOBJECT_PC_TEMPLATE)?;
  }
  Ok(written)
}
