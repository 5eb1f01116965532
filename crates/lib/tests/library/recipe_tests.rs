//! Option resolution, dependency graphs, patching and packaging through the
//! public API, without any external build tools.

use std::path::{Path, PathBuf};

use cairokit_lib::build::{self, BuildContext, BuildLayout, BuildOutputs};
use cairokit_lib::deps::InstalledDeps;
use cairokit_lib::execute::ToolPaths;
use cairokit_lib::manifest::ArtifactManifest;
use cairokit_lib::options::{LinkMode, Overrides, ResolvedConfig};
use cairokit_lib::platform::Platform;
use cairokit_lib::platform::arch::Arch;
use cairokit_lib::platform::compiler::{BuildType, Compiler, CompilerKind};
use cairokit_lib::platform::os::Os;
use cairokit_lib::recipe::Recipe;
use cairokit_lib::source::{PatchError, PatchOp, PatchSet, SourceTree};
use serial_test::serial;
use tempfile::TempDir;

use super::common::write;

fn resolve(platform: &Platform, pairs: &[&str]) -> ResolvedConfig {
  Recipe::default()
    .resolve(platform, &Overrides::parse_pairs(pairs).unwrap())
    .unwrap()
}

fn msvc() -> Platform {
  Platform::new(Arch::X86_64, Os::Windows).with_compiler(Compiler::new(CompilerKind::Msvc))
}

mod graph {
  use super::*;

  #[test]
  fn static_freetype_linux_build() {
    let recipe = Recipe::default();
    let config = resolve(&Platform::new(Arch::X86_64, Os::Linux), &["shared=false", "enable_ft=true"]);
    let graph = recipe.graph(&config).unwrap();

    for name in ["zlib", "pixman", "libpng", "freetype", "fontconfig"] {
      assert!(graph.contains(name), "missing {name}");
    }

    let config = resolve(
      &Platform::new(Arch::X86_64, Os::Linux),
      &["shared=false", "enable_ft=true", "enable_fc=false"],
    );
    let graph = recipe.graph(&config).unwrap();
    assert!(graph.contains("freetype"));
    assert!(!graph.contains("fontconfig"));
  }

  #[test]
  fn x11_backends_only_exist_on_linux() {
    let recipe = Recipe::default();
    let linux = recipe.graph(&resolve(&Platform::new(Arch::X86_64, Os::Linux), &[])).unwrap();
    let xorg = linux.get("xorg").unwrap();
    assert!(xorg.is_system());
    assert!(xorg.features.contains("xlib") && xorg.features.contains("xcb"));

    let mac = recipe.graph(&resolve(&Platform::new(Arch::Aarch64, Os::MacOs), &[])).unwrap();
    assert!(!mac.contains("xorg"));
  }

  #[test]
  fn windows_gcc_needs_msys2_but_msvc_does_not() {
    let recipe = Recipe::default();
    let gcc = Platform::new(Arch::X86_64, Os::Windows).with_compiler(Compiler::new(CompilerKind::Gcc));
    let names = |platform: &Platform| -> Vec<String> {
      recipe
        .graph(&resolve(platform, &[]))
        .unwrap()
        .tool_requires()
        .iter()
        .map(|s| s.name.clone())
        .collect()
    };

    assert_eq!(names(&gcc), vec!["7zip", "msys2", "pkgconf"]);
    assert_eq!(names(&msvc()), vec!["7zip"]);
  }

  #[test]
  fn linux_only_options_are_rejected_elsewhere() {
    let err = Recipe::default()
      .resolve(&msvc(), &Overrides::parse_pairs(&["enable_xcb=true"]).unwrap())
      .unwrap_err();
    assert!(err.to_string().contains("enable_xcb"));
  }
}

mod patching {
  use super::*;

  #[tokio::test]
  #[serial]
  async fn applying_a_patch_set_twice_fails() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/cairo-ft-font.c", "#if HAVE_UNISTD_H\n#endif\n");
    let tree = SourceTree::new(temp.path(), "1.15.14");
    let patches = Recipe::default().source_patches(&resolve(&Platform::new(Arch::X86_64, Os::Linux), &[]));
    let tools = ToolPaths::default();

    assert_eq!(tree.apply(&patches, &tools).await.unwrap(), 1);
    let err = tree.apply(&patches, &tools).await.unwrap_err();

    assert!(matches!(err, PatchError::AlreadyApplied { .. }));
    let patched = std::fs::read_to_string(tree.path("src/cairo-ft-font.c")).unwrap();
    assert_eq!(patched, "#ifdef HAVE_UNISTD_H\n#endif\n");
  }

  #[tokio::test]
  #[serial]
  async fn later_sets_still_apply_after_an_earlier_one() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Makefile", "CFLAGS = -MD\nLIBS = zdll.lib\n");
    let tree = SourceTree::new(temp.path(), "1.15.14");
    let tools = ToolPaths::default();

    let first = PatchSet::new().with(PatchOp::replace("Makefile", "-MD", "-MT"));
    let second = PatchSet::new().with(PatchOp::replace("Makefile", "zdll.lib", "zlib.lib"));
    tree.apply(&first, &tools).await.unwrap();
    tree.apply(&second, &tools).await.unwrap();

    let contents = std::fs::read_to_string(tree.path("Makefile")).unwrap();
    assert_eq!(contents, "CFLAGS = -MT\nLIBS = zlib.lib\n");
  }
}

mod packaging {
  use super::*;

  /// Package what the vendored makefile would leave behind and read the manifest back.
  fn package_msvc(temp: &Path, shared: bool) -> ArtifactManifest {
    let pairs = if shared {
      vec!["shared=true", "enable_glib=false"]
    } else {
      vec!["enable_glib=false"]
    };
    let platform = msvc().with_build_type(BuildType::Release);
    let config = resolve(&platform, &pairs);
    let graph = Recipe::default().graph(&config).unwrap();
    let source = SourceTree::new(temp.join("work/source_subfolder"), "1.15.14");
    write(&source.root, "COPYING", "license\n");

    let built = temp.join("built");
    let mut outputs = BuildOutputs {
      headers: vec![write(&built, "cairo.h", ""), write(&built, "cairo-win32.h", "")],
      pkgconfig: vec![write(&built, "cairo.pc", "prefix=/tmp\nName: cairo\n")],
      ..BuildOutputs::default()
    };
    if shared {
      outputs.libraries.push(write(&built, "cairo.lib", ""));
      outputs.runtimes.push(write(&built, "cairo.dll", ""));
    } else {
      outputs.libraries.push(write(&built, "cairo-static.lib", ""));
    }

    let deps = InstalledDeps::new();
    let tools = ToolPaths::default();
    let ctx = BuildContext {
      config: &config,
      graph: &graph,
      deps: &deps,
      source: &source,
      tools: &tools,
      layout: BuildLayout::new(&temp.join("work")),
    };
    build::package(&ctx, &outputs).unwrap();
    ArtifactManifest::read(&ctx.layout.package_dir()).unwrap()
  }

  #[test]
  fn static_and_shared_msvc_builds_share_a_canonical_name() {
    let static_dir = TempDir::new().unwrap();
    let shared_dir = TempDir::new().unwrap();

    let static_manifest = package_msvc(static_dir.path(), false);
    let shared_manifest = package_msvc(shared_dir.path(), true);

    let a = static_manifest.library("cairo").unwrap();
    let b = shared_manifest.library("cairo").unwrap();
    assert_eq!(a.file, b.file);
    assert_eq!(a.file, PathBuf::from("lib/cairo.lib"));
    assert_eq!(a.link, LinkMode::Static);
    assert_eq!(b.link, LinkMode::Shared);
    assert_eq!(a.runtime, None);
    assert_eq!(b.runtime, Some(PathBuf::from("bin/cairo.dll")));

    assert_eq!(static_manifest.defines, vec!["CAIRO_WIN32_STATIC_BUILD=1"]);
    assert!(shared_manifest.defines.is_empty());
    assert_eq!(static_manifest.system_libs, vec!["gdi32", "msimg32", "user32"]);
  }

  #[test]
  fn missing_library_fails_without_a_manifest() {
    let temp = TempDir::new().unwrap();
    let config = resolve(&msvc(), &[]);
    let graph = Recipe::default().graph(&config).unwrap();
    let source = SourceTree::new(temp.path().join("src"), "1.15.14");
    std::fs::create_dir_all(&source.root).unwrap();
    let built = temp.path().join("built");
    // cairo-gobject is expected because enable_glib defaults to on.
    let outputs = BuildOutputs {
      headers: vec![write(&built, "cairo.h", "")],
      libraries: vec![write(&built, "cairo-static.lib", "")],
      ..BuildOutputs::default()
    };
    let deps = InstalledDeps::new();
    let tools = ToolPaths::default();
    let ctx = BuildContext {
      config: &config,
      graph: &graph,
      deps: &deps,
      source: &source,
      tools: &tools,
      layout: BuildLayout::new(&temp.path().join("work")),
    };

    let err = build::package(&ctx, &outputs).unwrap_err();

    assert!(err.to_string().contains("cairo-gobject"));
    assert!(ArtifactManifest::read(&ctx.layout.package_dir()).is_err());
  }
}
