//! Shared fixtures: a fake cairo release archive, fake build tools and
//! dependency install roots, tied together by a profile.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use cairokit_lib::options::Overrides;
use cairokit_lib::pipeline::Pipeline;
use cairokit_lib::profile::Profile;
use tempfile::TempDir;

pub const VERSION: &str = "1.15.14";

/// Dependencies the default Linux configuration needs install roots for.
pub const LINUX_DEPS: &[(&str, &str)] = &[
  ("zlib", "z"),
  ("pixman", "pixman-1"),
  ("libpng", "png16"),
  ("freetype", "freetype"),
  ("fontconfig", "fontconfig"),
  ("glib", "glib-2.0"),
];

/// `configure` records the prefix and link mode for the fake `make install`.
const CONFIGURE: &str = r#"#!/bin/sh
echo "configure $@" >> "$STEPS_LOG"
for a in "$@"; do
  case "$a" in
    --prefix=*) echo "${a#--prefix=}" > .prefix;;
    --enable-shared) touch .shared;;
  esac
done
"#;

/// `make install` lays out what a real cairo install would.
const MAKE: &str = r#"#!/bin/sh
echo "make $@" >> "$STEPS_LOG"
[ "$1" = install ] || exit 0
prefix="$(cat .prefix)"
mkdir -p "$prefix/include/cairo" "$prefix/lib/pkgconfig"
touch "$prefix/include/cairo/cairo.h" "$prefix/include/cairo/cairo-ft.h"
printf 'prefix=%s\nlibdir=${prefix}/lib\n\nName: cairo\n' "$prefix" > "$prefix/lib/pkgconfig/cairo.pc"
for name in cairo cairo-gobject; do
  if [ -f .shared ]; then
    touch "$prefix/lib/lib$name.so.2.11514.0"
    ln -sf "lib$name.so.2.11514.0" "$prefix/lib/lib$name.so"
  else
    touch "$prefix/lib/lib$name.a"
  fi
  touch "$prefix/lib/lib$name.la"
done
"#;

pub fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
  let path = root.join(relative);
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(&path, contents).unwrap();
  path
}

pub fn executable(root: &Path, relative: &str, contents: &str) -> PathBuf {
  let path = write(root, relative, contents);
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// One isolated project: archive, tools, dependency roots and a work root.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new() -> Self {
    Self::with_configure(CONFIGURE)
  }

  /// A project with its own `configure` script. `$STEPS_LOG` in the script
  /// names the shared step log.
  pub fn with_configure(configure: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let project = Self { temp };
    let log = project.steps_log().display().to_string();
    project.archive(&configure.replace("$STEPS_LOG", &log));
    executable(project.path(), "bin/make", &MAKE.replace("$STEPS_LOG", &log));
    for (name, _) in LINUX_DEPS {
      let root = project.path().join("deps").join(name);
      std::fs::create_dir_all(root.join("include")).unwrap();
      write(
        &root,
        &format!("lib/pkgconfig/{name}.pc"),
        &format!("prefix=/built/{name}\nlibdir=${{prefix}}/lib\n\nName: {name}\n"),
      );
    }
    project
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn root(&self) -> PathBuf {
    self.path().join("root")
  }

  pub fn steps_log(&self) -> PathBuf {
    self.path().join("steps.log")
  }

  pub fn steps(&self) -> Vec<String> {
    std::fs::read_to_string(self.steps_log())
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }

  fn archive(&self, configure: &str) {
    let top = format!("cairo-{VERSION}");
    let content = self.path().join("content").join(&top);
    write(&content, "configure", configure);
    write(&content, "COPYING", "LGPL-2.1 or MPL-1.1\n");
    write(&content, "COPYING-MPL-1.1", "MPL\n");
    write(
      &content,
      "test/Makefile.am",
      "noinst_PROGRAMS = cairo-test-suite$(EXEEXT)\nTESTS = cairo-test-suite\n",
    );
    write(&content, "src/cairo-ft-font.c", "#if HAVE_UNISTD_H\n#include <unistd.h>\n#endif\n");

    let status = Command::new("tar")
      .arg("-cJf")
      .arg(self.path().join(format!("cairo-{VERSION}.tar.xz")))
      .arg("-C")
      .arg(self.path().join("content"))
      .arg(&top)
      .status()
      .unwrap();
    assert!(status.success());
  }

  /// Profile targeting x86_64 Linux with every dependency installed.
  pub fn profile_text(&self, extra: &str) -> String {
    let mut text = format!(
      r#"[settings]
os = "linux"
arch = "x86_64"

[source]
archive = "cairo-{VERSION}.tar.xz"

[tools]
make = "{make}"
jobs = 2
"#,
      make = self.path().join("bin/make").display()
    );
    for (name, lib) in LINUX_DEPS {
      text.push_str(&format!("\n[deps.{name}]\nroot = \"deps/{name}\"\nlibs = [\"{lib}\"]\n"));
    }
    text.push_str(extra);
    text
  }

  pub fn pipeline(&self, extra: &str, overrides: &[&str]) -> Pipeline {
    let path = write(self.path(), "profile.toml", &self.profile_text(extra));
    let profile = Profile::load(&path).unwrap();
    Pipeline::new(profile, Overrides::parse_pairs(overrides).unwrap(), &self.root())
  }
}
