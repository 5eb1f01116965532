//! Vendored `Makefile.win32` build for MSVC.

use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use super::{BuildContext, BuildError, BuildOutputs, ToolchainSession, pkgconfig};
use crate::options::{LinkMode, ResolvedConfig};
use crate::platform::compiler::Runtime;
use crate::execute::run_tool;
use crate::recipe::{GOBJECT_DIR, GOBJECT_HEADER, MSVC_HEADERS};
use crate::source::{PatchOp, PatchSet};

pub const WIN32_COMMON: &str = "build/Makefile.win32.common";

/// Hard-coded dependency library paths in the common makefile and the
/// dependency whose library replaces each.
const DEPENDENCY_LIBS: &[(&str, &str)] = &[
  ("$(ZLIB_PATH)/zdll.lib", "zlib"),
  ("$(LIBPNG_PATH)/libpng.lib", "libpng"),
  ("$(PIXMAN_PATH)/pixman/$(CFG)/pixman-1.lib", "pixman"),
];

fn runtime(config: &ResolvedConfig) -> Runtime {
  config
    .compiler()
    .runtime
    .unwrap_or_else(|| Runtime::default_for(config.build_type()))
}

/// Edits to `build/Makefile.win32.common`: runtime flags and dependency libraries.
pub fn makefile_patches(ctx: &BuildContext<'_>) -> Result<PatchSet, BuildError> {
  let runtime = format!("-{} ", runtime(ctx.config));
  let mut patches = PatchSet::new()
    .with(PatchOp::replace(WIN32_COMMON, "-MD ", &runtime))
    .with(PatchOp::replace(WIN32_COMMON, "-MDd ", &runtime));

  for (search, dep_name) in DEPENDENCY_LIBS {
    let dep = ctx.deps.get(dep_name)?;
    patches.push(PatchOp::replace(
      WIN32_COMMON,
      search,
      &format!("{}.lib", dep.primary_lib(dep_name)),
    ));
  }
  Ok(patches)
}

fn dep_path_arg(ctx: &BuildContext<'_>, var: &str, dep_name: &str) -> Result<String, BuildError> {
  Ok(format!("{var}={}", ctx.deps.get(dep_name)?.root.display()))
}

/// Patch, activate and run the vendored makefiles, then synthesize `.pc` files.
pub async fn run(ctx: &BuildContext<'_>, session: &ToolchainSession) -> Result<BuildOutputs, BuildError> {
  let root = &ctx.source.root;
  let cfg = format!("CFG={}", ctx.config.build_type());

  let patches = makefile_patches(ctx)?;
  ctx.source.apply(&patches, ctx.tools).await?;

  info!(cfg = %cfg, "building cairo with Makefile.win32");
  let invocation = session
    .invocation(&ctx.tools.make, root)
    .args(["-f", "Makefile.win32"])
    .arg(&cfg)
    .arg(dep_path_arg(ctx, "ZLIB_PATH", "zlib")?)
    .arg(dep_path_arg(ctx, "LIBPNG_PATH", "libpng")?)
    .arg(dep_path_arg(ctx, "PIXMAN_PATH", "pixman")?);
  run_tool(&invocation).await?;

  let gobject = ctx.config.is_enabled("enable_glib");
  if gobject {
    info!("building cairo-gobject");
    let invocation = session
      .invocation(&ctx.tools.make, &root.join(GOBJECT_DIR))
      .args(["-f", "Makefile.win32"])
      .arg(&cfg)
      .arg(dep_path_arg(ctx, "GLIB_PATH", "glib")?);
    run_tool(&invocation).await?;
  }

  let pkgconfig = pkgconfig::synthesize(
    ctx,
    &ctx.layout.generated_pkgconfig_dir(),
    &ctx.layout.package_dir(),
  )?;

  let mut outputs = BuildOutputs {
    pkgconfig,
    ..Default::default()
  };
  for (dir, file) in MSVC_HEADERS {
    outputs.headers.push(require_file(&root.join(dir), file)?);
  }
  collect_library(&root.join("src"), "cairo", ctx.config.link_mode(), &mut outputs)?;
  if gobject {
    outputs.headers.push(require_file(&root.join(GOBJECT_DIR), GOBJECT_HEADER)?);
    collect_library(&root.join(GOBJECT_DIR), "cairo-gobject", ctx.config.link_mode(), &mut outputs)?;
  }
  Ok(outputs)
}

fn require_file(dir: &Path, file: &str) -> Result<PathBuf, BuildError> {
  let path = dir.join(file);
  if path.is_file() {
    Ok(path)
  } else {
    Err(BuildError::MissingArtifact {
      what: file.to_string(),
      searched: dir.to_path_buf(),
    })
  }
}

fn find_named(dir: &Path, file: &str) -> Option<PathBuf> {
  WalkDir::new(dir)
    .sort_by_file_name()
    .into_iter()
    .filter_map(Result::ok)
    .find(|e| e.file_type().is_file() && e.file_name() == file)
    .map(|e| e.into_path())
}

/// Locate the makefile's output for `name`: `name-static.lib` for static
/// builds, `name.lib` plus `name.dll` for shared ones.
fn collect_library(dir: &Path, name: &str, link: LinkMode, outputs: &mut BuildOutputs) -> Result<(), BuildError> {
  let missing = |what: String| BuildError::MissingArtifact {
    what,
    searched: dir.to_path_buf(),
  };
  match link {
    LinkMode::Static => {
      let file = format!("{name}-static.lib");
      outputs.libraries.push(find_named(dir, &file).ok_or_else(|| missing(file))?);
    }
    LinkMode::Shared => {
      let lib = format!("{name}.lib");
      let dll = format!("{name}.dll");
      outputs.libraries.push(find_named(dir, &lib).ok_or_else(|| missing(lib))?);
      outputs.runtimes.push(find_named(dir, &dll).ok_or_else(|| missing(dll))?);
    }
  }
  Ok(())
}
