//! End-to-end runs of the configure strategy against fake build tools.

use std::path::PathBuf;

use cairokit_lib::ErrorKind;
use cairokit_lib::manifest::ArtifactManifest;
use cairokit_lib::options::LinkMode;
use serial_test::serial;

use super::common::{Project, executable};

#[tokio::test]
#[serial]
async fn static_build_produces_package_and_manifest() {
  let project = Project::new();
  let pipeline = project.pipeline("", &[]);

  let outcome = pipeline.run().await.unwrap();

  let steps = project.steps();
  assert_eq!(steps.len(), 3);
  assert!(steps[0].starts_with("configure --prefix="));
  assert!(steps[0].contains("--disable-shared --enable-static"));
  assert_eq!(steps[1], "make -j2");
  assert_eq!(steps[2], "make install");

  let manifest = &outcome.manifest;
  assert_eq!(manifest.library_names(), vec!["cairo", "cairo-gobject"]);
  let cairo = manifest.library("cairo").unwrap();
  assert_eq!(cairo.link, LinkMode::Static);
  assert_eq!(cairo.file, PathBuf::from("lib/libcairo.a"));
  assert_eq!(manifest.header_count(), 2);
  assert_eq!(manifest.system_libs, vec!["pthread", "m"]);
  assert_eq!(manifest.licenses.len(), 2);

  assert!(outcome.package_dir.join("lib/libcairo.a").exists());
  assert!(!outcome.package_dir.join("lib/libcairo.la").exists());
  assert!(outcome.package_dir.join("include/cairo/cairo.h").exists());

  let pc = std::fs::read_to_string(outcome.package_dir.join("lib/pkgconfig/cairo.pc")).unwrap();
  assert!(pc.starts_with(&format!("prefix={}", outcome.package_dir.display())));

  let read_back = ArtifactManifest::read(&outcome.package_dir).unwrap();
  assert_eq!(&read_back, manifest);
}

#[tokio::test]
#[serial]
async fn recipe_patches_reach_the_source_tree() {
  let project = Project::new();
  let outcome = project.pipeline("", &[]).run().await.unwrap();

  let ft = std::fs::read_to_string(outcome.source.path("src/cairo-ft-font.c")).unwrap();
  assert!(ft.starts_with("#ifdef HAVE_UNISTD_H"));
  let harness = std::fs::read_to_string(outcome.source.path("test/Makefile.am")).unwrap();
  assert!(!harness.contains("noinst_PROGRAMS"));
}

#[tokio::test]
#[serial]
async fn freetype_patch_is_skipped_when_disabled() {
  let project = Project::new();
  let outcome = project.pipeline("", &["enable_ft=false"]).run().await.unwrap();

  assert!(!outcome.graph.contains("freetype"));
  let ft = std::fs::read_to_string(outcome.source.path("src/cairo-ft-font.c")).unwrap();
  assert!(ft.starts_with("#if HAVE_UNISTD_H"));
  assert!(project.steps()[0].contains("--disable-ft"));
}

#[tokio::test]
#[serial]
async fn shared_and_static_builds_report_the_same_library_names() {
  let project = Project::new();

  let static_run = project.pipeline("", &[]).run().await.unwrap();
  let shared_run = project.pipeline("", &["shared=true"]).run().await.unwrap();

  assert_ne!(static_run.package_dir, shared_run.package_dir);
  assert_eq!(static_run.manifest.library_names(), shared_run.manifest.library_names());

  let shared = shared_run.manifest.library("cairo").unwrap();
  assert_eq!(shared.link, LinkMode::Shared);
  assert_eq!(shared.file, PathBuf::from("lib/libcairo.so"));
  let link = shared_run.package_dir.join("lib/libcairo.so");
  assert!(link.is_symlink());
  assert_eq!(std::fs::read_link(&link).unwrap(), PathBuf::from("libcairo.so.2.11514.0"));
}

#[tokio::test]
#[serial]
async fn profile_options_and_user_patches() {
  let project = Project::new();
  let extra = r#"
[options]
enable_glib = false

[[source.patches]]
file = "COPYING"
search = "LGPL-2.1"
replace = "LGPL-2.1-only"
"#;

  let outcome = project.pipeline(extra, &[]).run().await.unwrap();

  assert_eq!(outcome.manifest.library_names(), vec!["cairo"]);
  let license = std::fs::read_to_string(outcome.package_dir.join("licenses/COPYING")).unwrap();
  assert!(license.starts_with("LGPL-2.1-only"));
}

#[tokio::test]
#[serial]
async fn unmatched_user_patch_fails_before_configure() {
  let project = Project::new();
  let extra = r#"
[[source.patches]]
file = "src/cairo-ft-font.c"
search = "this text is not in the file"
replace = "x"
"#;

  let err = project.pipeline(extra, &[]).run().await.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::PatchError);
  assert!(project.steps().is_empty());
}

#[tokio::test]
#[serial]
async fn failing_configure_is_a_tool_error_and_nothing_is_packaged() {
  let project = Project::with_configure(
    "#!/bin/sh\necho \"configure $@\" >> \"$STEPS_LOG\"\necho 'configure: error: pixman >= 0.30.0 required' >&2\nexit 1\n",
  );
  let pipeline = project.pipeline("", &[]);

  let err = pipeline.run().await.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::ToolInvocationError);
  assert!(err.to_string().contains("pixman >= 0.30.0 required"));
  let steps = project.steps();
  assert_eq!(steps.len(), 1);
  assert!(steps[0].starts_with("configure "));

  let config = pipeline.resolve().unwrap();
  let work_dir = pipeline.work_dir(&config).unwrap();
  assert!(!work_dir.join("package").exists());
}

#[tokio::test]
#[serial]
async fn rerun_starts_from_a_pristine_tree() {
  let project = Project::new();
  let pipeline = project.pipeline("", &[]);

  let first = pipeline.run().await.unwrap();
  let second = pipeline.run().await.unwrap();

  assert_eq!(first.package_dir, second.package_dir);
  assert_eq!(first.manifest, second.manifest);
  assert_eq!(project.steps().len(), 6);
}

#[tokio::test]
#[serial]
async fn failed_rebuild_removes_the_previous_package() {
  let project = Project::new();
  let pipeline = project.pipeline("", &[]);
  let first = pipeline.run().await.unwrap();
  assert!(first.package_dir.join("cairokit-manifest.json").exists());

  executable(project.path(), "bin/make", "#!/bin/sh\necho 'make: *** [all] Error 2' >&2\nexit 2\n");
  let err = pipeline.run().await.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::ToolInvocationError);
  assert!(!first.package_dir.exists());
  assert!(ArtifactManifest::read(&first.package_dir).is_err());
  assert!(!first.package_dir.with_file_name("package.partial").exists());
}

#[tokio::test]
#[serial]
async fn missing_install_root_is_reported_before_any_work() {
  let project = Project::new();
  let text = project.profile_text("").replace("[deps.pixman]", "[deps.unused]");
  let path = super::common::write(project.path(), "profile.toml", &text);
  let profile = cairokit_lib::profile::Profile::load(&path).unwrap();
  let pipeline = cairokit_lib::pipeline::Pipeline::new(profile, Default::default(), &project.root());

  let err = pipeline.run().await.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::MissingDependency);
  assert!(err.to_string().contains("pixman"));
  assert!(!project.root().exists());
}
