//! The cairo recipe: options, dependencies, build tools, source patches and
//! consumer metadata.

use crate::consts::{DEFAULT_VERSION, PACKAGE_NAME};
use crate::deps::{self, Condition, DependencyGraph, DependencyRule, DependencySpec, DepsError, ToolRule, VersionConstraint};
use crate::options::{self, OptionDecl, OptionError, OptionSchema, Overrides, PlatformPredicate, ResolvedConfig};
use crate::platform::Platform;
use crate::platform::compiler::CompilerKind;
use crate::platform::os::Os;
use crate::source::{PatchOp, PatchSet};

/// Optional cairo features, in `configure` flag order, with their controlling options.
pub const FEATURES: &[(&str, &[&str])] = &[
  ("ft", &["enable_ft"]),
  ("fc", &["enable_fc"]),
  ("xlib", &["enable_xlib"]),
  ("xcb", &["enable_xcb"]),
  ("xlib-xcb", &["enable_xlib", "enable_xcb"]),
  ("gobject", &["enable_glib"]),
];

/// Public headers installed by the vendored makefile build, as `(dir, file)`
/// relative to the source root.
pub const MSVC_HEADERS: &[(&str, &str)] = &[
  ("", "cairo-version.h"),
  ("src", "cairo-features.h"),
  ("src", "cairo.h"),
  ("src", "cairo-deprecated.h"),
  ("src", "cairo-win32.h"),
  ("src", "cairo-script.h"),
  ("src", "cairo-ps.h"),
  ("src", "cairo-pdf.h"),
  ("src", "cairo-svg.h"),
];

pub const GOBJECT_DIR: &str = "util/cairo-gobject";
pub const GOBJECT_HEADER: &str = "cairo-gobject.h";

/// License files copied from the source root.
pub const LICENSE_PATTERNS: &[&str] = &["COPYING", "LICENSE"];

#[derive(Debug, Clone)]
pub struct Recipe {
  pub name: String,
  pub version: String,
  pub schema: OptionSchema,
  pub requires: Vec<DependencyRule>,
  pub tools: Vec<ToolRule>,
}

impl Default for Recipe {
  fn default() -> Self {
    Self::cairo(DEFAULT_VERSION)
  }
}

impl Recipe {
  pub fn cairo(version: &str) -> Self {
    let not_windows = PlatformPredicate::OsNotIn(vec![Os::Windows]);
    let linux_only = PlatformPredicate::OsIn(vec![Os::Linux]);
    // Makefile.win32 only builds the win32 font backend.
    let not_msvc = PlatformPredicate::CompilerIsNot(CompilerKind::Msvc);

    let schema = OptionSchema::new()
      .declare(OptionDecl::boolean("shared", false).describe("build a shared library"))
      .declare(
        OptionDecl::boolean("fPIC", true)
          .describe("position-independent code")
          .available_when(not_windows),
      )
      .declare(
        OptionDecl::boolean("enable_ft", true)
          .describe("FreeType font backend")
          .available_when(not_msvc.clone()),
      )
      .declare(
        OptionDecl::boolean("enable_fc", true)
          .describe("Fontconfig font configuration")
          .default_when(PlatformPredicate::OsIn(vec![Os::Windows]), false)
          .available_when(not_msvc),
      )
      .declare(
        OptionDecl::boolean("enable_xlib", true)
          .describe("Xlib surface backend")
          .available_when(linux_only.clone()),
      )
      .declare(
        OptionDecl::boolean("enable_xcb", true)
          .describe("XCB surface backend")
          .available_when(linux_only),
      )
      .declare(OptionDecl::boolean("enable_glib", true).describe("GObject bindings (cairo-gobject)"));

    let requires = vec![
      DependencyRule::core("zlib", VersionConstraint::minimum(1, 2, 11)),
      DependencyRule::core("pixman", VersionConstraint::minimum(0, 38, 4)),
      DependencyRule::core("libpng", VersionConstraint::minimum(1, 6, 37)),
      DependencyRule::optional(
        "freetype",
        VersionConstraint::minimum(2, 10, 4),
        Condition::any_enabled(&["enable_ft"]),
      ),
      DependencyRule::optional(
        "fontconfig",
        VersionConstraint::minimum(2, 13, 92),
        Condition::any_enabled(&["enable_fc"]),
      ),
      DependencyRule::optional(
        "xorg",
        VersionConstraint::System,
        Condition::any_enabled(&["enable_xlib", "enable_xcb"]),
      )
      .feature("xlib", Condition::any_enabled(&["enable_xlib"]))
      .feature("xcb", Condition::any_enabled(&["enable_xcb"])),
      DependencyRule::optional(
        "glib",
        VersionConstraint::minimum(2, 64, 0),
        Condition::any_enabled(&["enable_glib"]),
      )
      .feature("gobject", Condition::Always),
    ];

    let tools = vec![
      ToolRule {
        spec: DependencySpec::new("7zip", VersionConstraint::minimum(19, 0, 0)),
        when: PlatformPredicate::OsIn(vec![Os::Windows]),
      },
      ToolRule {
        spec: DependencySpec::new("msys2", VersionConstraint::minimum(20200517, 0, 0)),
        when: PlatformPredicate::All(vec![
          PlatformPredicate::OsIn(vec![Os::Windows]),
          PlatformPredicate::CompilerIsNot(CompilerKind::Msvc),
        ]),
      },
      ToolRule {
        spec: DependencySpec::new("pkgconf", VersionConstraint::minimum(1, 7, 3)),
        when: PlatformPredicate::CompilerIsNot(CompilerKind::Msvc),
      },
    ];

    Self {
      name: PACKAGE_NAME.to_string(),
      version: version.to_string(),
      schema,
      requires,
      tools,
    }
  }

  pub fn resolve(&self, platform: &Platform, overrides: &Overrides) -> Result<ResolvedConfig, OptionError> {
    options::resolve(&self.schema, platform, overrides)
  }

  pub fn graph(&self, config: &ResolvedConfig) -> Result<DependencyGraph, DepsError> {
    deps::build_graph(&self.requires, &self.tools, config)
  }

  /// Patches applied to the pristine tree before any build strategy runs.
  pub fn source_patches(&self, config: &ResolvedConfig) -> PatchSet {
    let mut patches = PatchSet::new();
    if config.is_enabled("enable_ft") {
      patches.push(PatchOp::replace(
        "src/cairo-ft-font.c",
        "#if HAVE_UNISTD_H",
        "#ifdef HAVE_UNISTD_H",
      ));
    }
    patches
  }
}

/// Library link names produced for `config`, in link order.
pub fn libraries(config: &ResolvedConfig) -> Vec<&'static str> {
  let mut libs = vec!["cairo"];
  if config.is_enabled("enable_glib") {
    libs.push("cairo-gobject");
  }
  libs
}

/// `configure` feature switches for `config`, as `(feature, enabled)`.
pub fn feature_switches(config: &ResolvedConfig) -> Vec<(&'static str, bool)> {
  FEATURES
    .iter()
    .map(|(feature, options)| (*feature, options.iter().all(|o| config.is_enabled(o))))
    .collect()
}

/// Defines consumers must set.
pub fn defines(config: &ResolvedConfig) -> Vec<String> {
  if config.os().is_windows() && config.link_mode() == options::LinkMode::Static {
    vec!["CAIRO_WIN32_STATIC_BUILD=1".to_string()]
  } else {
    Vec::new()
  }
}

pub fn system_libs(os: Os) -> &'static [&'static str] {
  match os {
    Os::Windows => &["gdi32", "msimg32", "user32"],
    Os::Linux => &["pthread", "m"],
    Os::MacOs => &[],
  }
}

pub fn frameworks(os: Os) -> &'static [&'static str] {
  match os {
    Os::MacOs => &["CoreGraphics", "CoreFoundation"],
    _ => &[],
  }
}

/// pkg-config module a dependency installs, when it has one.
pub fn pkgconfig_module(dependency: &str) -> Option<&'static str> {
  match dependency {
    "zlib" => Some("zlib"),
    "pixman" => Some("pixman-1"),
    "libpng" => Some("libpng"),
    "freetype" => Some("freetype2"),
    "fontconfig" => Some("fontconfig"),
    "glib" => Some("glib-2.0"),
    _ => None,
  }
}
