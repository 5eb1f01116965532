//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// `configure` records the prefix and link mode for the fake `make install`.
const CONFIGURE: &str = r#"#!/bin/sh
for a in "$@"; do
  case "$a" in
    --prefix=*) echo "${a#--prefix=}" > .prefix;;
    --enable-shared) touch .shared;;
  esac
done
"#;

/// A `make` whose `install` target lays out a cairo install tree.
const MAKE: &str = r#"#!/bin/sh
echo "make $@" >> "$(dirname "$0")/make.log"
[ "$1" = install ] || exit 0
prefix="$(cat .prefix)"
mkdir -p "$prefix/include/cairo" "$prefix/lib/pkgconfig"
touch "$prefix/include/cairo/cairo.h"
for name in cairo cairo-gobject; do
  if [ -f .shared ]; then
    touch "$prefix/lib/lib$name.so.2.11514.0"
    ln -sf "lib$name.so.2.11514.0" "$prefix/lib/lib$name.so"
  else
    touch "$prefix/lib/lib$name.a"
  fi
done
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the profile, the
/// dependency roots it names and the cairokit work root.
pub struct TestEnv {
  pub temp: TempDir,
  pub profile_path: PathBuf,
}

impl TestEnv {
  /// Create from a fixture profile.
  ///
  /// Copies the fixture content to a temporary `profile.toml` file.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let profile_path = temp.path().join("profile.toml");
    std::fs::write(&profile_path, fixture_content(name)).unwrap();
    Self { temp, profile_path }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Append raw TOML to the profile.
  pub fn append_profile(&self, toml: &str) {
    let mut text = std::fs::read_to_string(&self.profile_path).unwrap();
    text.push_str(toml);
    std::fs::write(&self.profile_path, text).unwrap();
  }

  /// Work root (isolated per test).
  pub fn root_path(&self) -> PathBuf {
    let p = self.temp.path().join("cairokit");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn make_log(&self) -> String {
    std::fs::read_to_string(self.temp.path().join("bin/make.log")).unwrap_or_default()
  }

  /// Release archive, dependency roots and a fake `make` for a Linux build.
  #[cfg(unix)]
  pub fn with_fake_toolchain(self) -> Self {
    use std::os::unix::fs::PermissionsExt;

    let content = self.temp.path().join("content/cairo-1.15.14");
    for (file, body) in [
      ("configure", CONFIGURE),
      ("COPYING", "LGPL-2.1 or MPL-1.1\n"),
      ("test/Makefile.am", "noinst_PROGRAMS = cairo-test-suite$(EXEEXT)\n"),
      ("src/cairo-ft-font.c", "#if HAVE_UNISTD_H\n#endif\n"),
    ] {
      let path = content.join(file);
      std::fs::create_dir_all(path.parent().unwrap()).unwrap();
      std::fs::write(path, body).unwrap();
    }
    let status = std::process::Command::new("tar")
      .arg("-cJf")
      .arg(self.temp.path().join("cairo-1.15.14.tar.xz"))
      .arg("-C")
      .arg(self.temp.path().join("content"))
      .arg("cairo-1.15.14")
      .status()
      .unwrap();
    assert!(status.success());

    for name in ["zlib", "pixman", "libpng", "freetype", "fontconfig", "glib"] {
      self.write_file(&format!("deps/{name}/lib/pkgconfig/{name}.pc"), "prefix=/built\n");
      std::fs::create_dir_all(self.temp.path().join(format!("deps/{name}/include"))).unwrap();
    }

    let make = self.write_file("bin/make", MAKE);
    std::fs::set_permissions(&make, std::fs::Permissions::from_mode(0o755)).unwrap();
    self.append_profile(&format!("\n[tools]\nmake = \"{}\"\njobs = 2\n", make.display()));
    self
  }

  /// Get a pre-configured Command for the cairokit binary.
  ///
  /// `CAIROKIT_ROOT` points at an isolated work root; the cache locations are
  /// redirected too so nothing escapes the temp directory.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("cairokit");
    cmd.env("CAIROKIT_ROOT", self.root_path());
    cmd.env("XDG_CACHE_HOME", self.temp.path().join("cache"));
    cmd.env("LOCALAPPDATA", self.temp.path().join("cache"));
    cmd
  }

  /// `cmd()` with `<subcommand> --profile <profile>`.
  pub fn recipe_cmd(&self, subcommand: &str) -> Command {
    let mut cmd = self.cmd();
    cmd.arg(subcommand).arg("--profile").arg(&self.profile_path);
    cmd
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }
}
