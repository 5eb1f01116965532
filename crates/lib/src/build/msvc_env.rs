//! MSVC environment activation.
//!
//! `vcvarsall.bat` is run once through `cmd`, followed by `set`; the printed
//! variables become a [`ToolchainSession`] that overlays every make
//! invocation of the vendored makefile build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{BuildContext, BuildError, ToolchainSession};
use crate::execute::{ToolInvocation, ToolPaths, run_tool};

/// Explicit `vcvarsall.bat` location, checked after the profile.
pub const VCVARSALL_ENV: &str = "VCVARSALL";

const VSWHERE: &str = r"Microsoft Visual Studio\Installer\vswhere.exe";
const VCVARSALL_RELATIVE: &str = r"VC\Auxiliary\Build\vcvarsall.bat";

/// Parse `set` output (`NAME=value` per line) into variables.
pub fn parse_set_output(output: &str) -> BTreeMap<String, String> {
  output
    .lines()
    .filter_map(|line| {
      let line = line.trim_end_matches('\r');
      let (key, value) = line.split_once('=')?;
      // `cmd` also prints pseudo-variables such as `=C:=C:\`.
      (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
    })
    .collect()
}

async fn vswhere_vcvars() -> Option<PathBuf> {
  let program_files = std::env::var("ProgramFiles(x86)").ok()?;
  let vswhere = Path::new(&program_files).join(VSWHERE);
  if !vswhere.is_file() {
    return None;
  }
  let invocation = ToolInvocation::new(vswhere.display().to_string(), Path::new(&program_files))
    .args(["-latest", "-products", "*", "-property", "installationPath"]);
  let output = run_tool(&invocation).await.ok()?;
  let install = output.stdout.lines().next()?.trim().to_string();
  let candidate = Path::new(&install).join(VCVARSALL_RELATIVE);
  candidate.is_file().then_some(candidate)
}

/// `vcvarsall.bat` named by the profile or `VCVARSALL`, if either is set.
pub fn configured_vcvars(tools: &ToolPaths) -> Result<Option<PathBuf>, BuildError> {
  let (path, origin) = match (&tools.vcvars, std::env::var(VCVARSALL_ENV)) {
    (Some(path), _) => (path.clone(), "tools.vcvars"),
    (None, Ok(path)) if !path.is_empty() => (PathBuf::from(path), VCVARSALL_ENV),
    _ => return Ok(None),
  };
  if path.is_file() {
    Ok(Some(path))
  } else {
    Err(BuildError::Environment {
      message: format!("{origin} points to {}, which does not exist", path.display()),
    })
  }
}

/// Find `vcvarsall.bat`: profile, then `VCVARSALL`, then `vswhere`.
pub async fn locate_vcvars(tools: &ToolPaths) -> Result<PathBuf, BuildError> {
  if let Some(path) = configured_vcvars(tools)? {
    return Ok(path);
  }
  vswhere_vcvars().await.ok_or_else(|| BuildError::Environment {
    message: format!("vcvarsall.bat not found; set tools.vcvars or {VCVARSALL_ENV}"),
  })
}

/// Layer dependency paths and compiler flags on top of captured variables.
pub fn overlay(ctx: &BuildContext<'_>, captured: BTreeMap<String, String>) -> ToolchainSession {
  let mut session = ToolchainSession::from_vars(captured);

  let mut includes = Vec::new();
  let mut libs = Vec::new();
  for (_, dep) in ctx.deps.ordered(ctx.graph) {
    includes.extend(dep.include_paths());
    libs.extend(dep.lib_paths());
  }
  session.prepend_list("INCLUDE", &includes, ";");
  session.prepend_list("LIB", &libs, ";");
  // Parallel CL.EXE instances share one PDB.
  session.append_flag("CL", "/FS");
  session
}

/// Activate the MSVC environment for the configured architecture.
pub async fn activate(ctx: &BuildContext<'_>) -> Result<ToolchainSession, BuildError> {
  let vcvars = locate_vcvars(ctx.tools).await?;
  let arch = ctx.config.arch().vcvars_arg();
  info!(vcvars = ?vcvars, arch = %arch, "activating MSVC environment");

  let invocation = ToolInvocation::new("cmd", &ctx.source.root)
    .arg("/C")
    .arg("call")
    .arg(vcvars.display().to_string())
    .arg(arch)
    .arg(">NUL")
    .arg("&&")
    .arg("set");
  let output = run_tool(&invocation).await?;

  let captured = parse_set_output(&output.stdout);
  debug!(variables = captured.len(), "captured MSVC environment");
  if !captured.contains_key("INCLUDE") && !captured.contains_key("include") {
    return Err(BuildError::Environment {
      message: format!("{} did not set INCLUDE", vcvars.display()),
    });
  }
  Ok(overlay(ctx, captured))
}
