//! Autotools build: `configure`, `make`, `make install`.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::{BuildContext, BuildError, BuildOutputs, ToolchainSession, pkgconfig};
use crate::consts::INCLUDE_NAMESPACE;
use crate::execute::run_tool;
use crate::options::{LinkMode, ResolvedConfig};
use crate::platform::compiler::BuildType;
use crate::recipe;
use crate::source::{PatchOp, PatchSet};

const TEST_HARNESS_DECL: &str = "noinst_PROGRAMS = cairo-test-suite$(EXEEXT)";

/// Files `autogen.sh` expects but snapshot tarballs may lack.
const AUTOTOOLS_STUBS: &[&str] = &["ChangeLog", "src/Makefile.am.features", "boilerplate/Makefile.am.features"];

/// Compiler and linker flags passed to `configure` through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerFlags {
  pub cflags: Vec<String>,
  pub cppflags: Vec<String>,
  pub ldflags: Vec<String>,
}

pub fn compiler_flags(ctx: &BuildContext<'_>) -> CompilerFlags {
  let config = ctx.config;
  let os = config.os();
  let mut flags = CompilerFlags::default();

  if config.compiler().kind.is_gcc_family() {
    flags.cflags.push("-Wno-enum-conversion".to_string());
  }
  if config.is_enabled("fPIC") {
    flags.cflags.push("-fPIC".to_string());
  }
  match config.build_type() {
    BuildType::Debug => flags.cflags.extend(["-g".to_string(), "-O0".to_string()]),
    BuildType::Release => flags.cflags.push("-O2".to_string()),
  }

  for (_, dep) in ctx.deps.ordered(ctx.graph) {
    flags
      .cppflags
      .extend(dep.include_paths().iter().map(|p| format!("-I{}", pkgconfig::tool_path(p, config.platform()))));
    flags
      .ldflags
      .extend(dep.lib_paths().iter().map(|p| format!("-L{}", pkgconfig::tool_path(p, config.platform()))));
  }
  for framework in recipe::frameworks(os) {
    flags.ldflags.push("-framework".to_string());
    flags.ldflags.push(framework.to_string());
  }
  flags
}

/// Arguments to `configure`.
pub fn configure_args(config: &ResolvedConfig, prefix: &str) -> Vec<String> {
  let mut args = vec![format!("--prefix={prefix}")];
  match config.link_mode() {
    LinkMode::Shared => args.extend(["--enable-shared".to_string(), "--disable-static".to_string()]),
    LinkMode::Static => args.extend(["--disable-shared".to_string(), "--enable-static".to_string()]),
  }
  for (feature, enabled) in recipe::feature_switches(config) {
    let verb = if enabled { "enable" } else { "disable" };
    args.push(format!("--{verb}-{feature}"));
  }
  args
}

/// Empty the test suite declaration so the harness is never built.
pub fn harness_patches() -> PatchSet {
  PatchSet::new().with(PatchOp::replace("test/Makefile.am", TEST_HARNESS_DECL, ""))
}

fn ensure_autotools_stubs(root: &Path) -> std::io::Result<()> {
  for stub in AUTOTOOLS_STUBS {
    let path = root.join(stub);
    if !path.exists() {
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(&path, "")?;
      debug!(file = ?path, "created empty autotools file");
    }
  }
  Ok(())
}

fn session(ctx: &BuildContext<'_>, flags: &CompilerFlags) -> ToolchainSession {
  let mut session = ToolchainSession::new();
  session.set("CFLAGS", flags.cflags.join(" "));
  session.set("CPPFLAGS", flags.cppflags.join(" "));
  session.set("LDFLAGS", flags.ldflags.join(" "));
  session.set(
    "PKG_CONFIG_PATH",
    pkgconfig::tool_path(&ctx.layout.pkgconfig_dir(), ctx.config.platform()),
  );
  session
}

/// Run every step in order; the first failure aborts the build.
pub async fn run(ctx: &BuildContext<'_>) -> Result<BuildOutputs, BuildError> {
  let root = &ctx.source.root;
  let install_dir = ctx.layout.install_dir();

  pkgconfig::stage_dependency_metadata(ctx, &ctx.layout.pkgconfig_dir())?;
  let flags = compiler_flags(ctx);
  ctx.source.apply(&harness_patches(), ctx.tools).await?;
  ensure_autotools_stubs(root)?;

  if install_dir.exists() {
    std::fs::remove_dir_all(&install_dir)?;
  }
  let session = session(ctx, &flags);

  if !root.join("configure").exists() {
    info!("bootstrapping with autogen.sh");
    let autogen = session
      .invocation(&ctx.tools.shell, root)
      .arg("./autogen.sh")
      .env("NOCONFIGURE", "1")
      .env("GTKDOCIZE", "echo");
    run_tool(&autogen).await?;
  }

  info!(prefix = ?install_dir, "configuring");
  let configure = session
    .invocation(&ctx.tools.shell, root)
    .arg("./configure")
    .args(configure_args(ctx.config, &pkgconfig::tool_path(&install_dir, ctx.config.platform())));
  run_tool(&configure).await?;

  info!(jobs = ctx.tools.jobs, "building");
  let make = session
    .invocation(&ctx.tools.make, root)
    .arg(format!("-j{}", ctx.tools.jobs.max(1)));
  run_tool(&make).await?;

  info!("installing");
  run_tool(&session.invocation(&ctx.tools.make, root).arg("install")).await?;

  collect_installed(&install_dir)
}

fn files_in(dir: &Path) -> impl Iterator<Item = PathBuf> {
  WalkDir::new(dir)
    .min_depth(1)
    .max_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_map(Result::ok)
    .filter(|e| !e.file_type().is_dir())
    .map(|e| e.into_path())
}

fn has_extension(path: &Path, ext: &str) -> bool {
  path.extension().is_some_and(|e| e == ext)
}

/// Everything `make install` produced under `prefix`.
pub fn collect_installed(prefix: &Path) -> Result<BuildOutputs, BuildError> {
  let include = prefix.join("include").join(INCLUDE_NAMESPACE);
  let lib = prefix.join("lib");

  let outputs = BuildOutputs {
    headers: files_in(&include).filter(|p| has_extension(p, "h")).collect(),
    libraries: files_in(&lib).filter(|p| !has_extension(p, "la")).collect(),
    runtimes: files_in(&prefix.join("bin")).filter(|p| has_extension(p, "dll")).collect(),
    pkgconfig: files_in(&lib.join("pkgconfig")).filter(|p| has_extension(p, "pc")).collect(),
  };

  if outputs.headers.is_empty() {
    return Err(BuildError::MissingArtifact {
      what: "installed headers".to_string(),
      searched: include,
    });
  }
  if outputs.libraries.is_empty() {
    return Err(BuildError::MissingArtifact {
      what: "installed libraries".to_string(),
      searched: lib,
    });
  }
  Ok(outputs)
}
