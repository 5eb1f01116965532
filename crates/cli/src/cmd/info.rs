use anyhow::Result;
use serde_json::json;

use cairokit_lib::consts::{DEFAULT_VERSION, PACKAGE_NAME};
use cairokit_lib::platform::{Platform, paths, platform_triple};

use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let host = Platform::current();
  let root = paths::root_dir();

  if output.is_json() {
    return print_json(&json!({
      "version": env!("CARGO_PKG_VERSION"),
      "package": PACKAGE_NAME,
      "default_upstream_version": DEFAULT_VERSION,
      "host": platform_triple(),
      "compiler": host.as_ref().map(|p| p.compiler.to_string()),
      "root": root,
    }));
  }

  println!("cairokit {}", env!("CARGO_PKG_VERSION"));
  match &host {
    Some(platform) => {
      print_stat("Host", &platform.triple());
      print_stat("Compiler", &platform.compiler.to_string());
    }
    None => print_info("Could not detect platform."),
  }
  print_stat("Upstream", &format!("{PACKAGE_NAME} {DEFAULT_VERSION}"));
  print_stat("Root", &root.display().to_string());
  Ok(())
}
