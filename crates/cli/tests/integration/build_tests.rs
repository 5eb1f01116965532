//! `source`, `build` and `manifest` integration tests against a fake toolchain.

#![cfg(unix)]

use predicates::prelude::*;
use serde_json::Value;

use super::common::TestEnv;

fn build_json(env: &TestEnv, options: &[&str]) -> Value {
  let mut cmd = env.recipe_cmd("build");
  for option in options {
    cmd.arg("-o").arg(option);
  }
  let output = cmd.arg("--output").arg("json").output().unwrap();
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn source_prepares_a_patched_tree() {
  let env = TestEnv::from_fixture("linux.toml").with_fake_toolchain();

  let output = env.recipe_cmd("source").arg("--output").arg("json").output().unwrap();
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  let value: Value = serde_json::from_slice(&output.stdout).unwrap();

  let root = std::path::PathBuf::from(value["root"].as_str().unwrap());
  assert!(root.ends_with("source_subfolder"));
  let ft = std::fs::read_to_string(root.join("src/cairo-ft-font.c")).unwrap();
  assert!(ft.starts_with("#ifdef HAVE_UNISTD_H"));
  assert_eq!(value["patches"].as_array().unwrap().len(), 1);
  assert!(env.make_log().is_empty());
}

#[test]
fn static_build_prints_summary() {
  let env = TestEnv::from_fixture("linux.toml").with_fake_toolchain();

  env
    .recipe_cmd("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built cairo 1.15.14 for x86_64-linux"))
    .stdout(predicate::str::contains("cairo (static) lib/libcairo.a"))
    .stdout(predicate::str::contains("cairo-gobject (static) lib/libcairo-gobject.a"));

  assert_eq!(env.make_log().lines().collect::<Vec<_>>(), vec!["make -j2", "make install"]);
}

#[test]
fn static_and_shared_manifests_name_the_same_libraries() {
  let env = TestEnv::from_fixture("linux.toml").with_fake_toolchain();

  let static_manifest = build_json(&env, &[]);
  let shared_manifest = build_json(&env, &["shared=true"]);

  let libs = |m: &Value| -> Vec<(String, String)> {
    m["libraries"]
      .as_array()
      .unwrap()
      .iter()
      .map(|l| (l["name"].as_str().unwrap().to_string(), l["link"].as_str().unwrap().to_string()))
      .collect()
  };
  let static_libs = libs(&static_manifest);
  let shared_libs = libs(&shared_manifest);
  assert_eq!(static_libs.len(), shared_libs.len());
  for ((a, a_link), (b, b_link)) in static_libs.iter().zip(&shared_libs) {
    assert_eq!(a, b);
    assert_eq!(a_link, "static");
    assert_eq!(b_link, "shared");
  }
  assert_eq!(shared_manifest["libraries"][0]["file"], "lib/libcairo.so");
}

#[test]
fn manifest_command_reads_back_the_package() {
  let env = TestEnv::from_fixture("linux.toml").with_fake_toolchain();
  let resolved = {
    let output = env.recipe_cmd("resolve").arg("--output").arg("json").output().unwrap();
    serde_json::from_slice::<Value>(&output.stdout).unwrap()
  };
  let built = build_json(&env, &[]);
  let package_dir = std::path::Path::new(resolved["work_dir"].as_str().unwrap()).join("package");

  let output = env
    .cmd()
    .arg("manifest")
    .arg(&package_dir)
    .arg("--output")
    .arg("json")
    .output()
    .unwrap();
  assert!(output.status.success());
  let read_back: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(read_back, built);

  env
    .cmd()
    .arg("manifest")
    .arg(&package_dir)
    .assert()
    .success()
    .stdout(predicate::str::contains("cairo/1.15.14 (x86_64-linux)"))
    .stdout(predicate::str::contains("system   pthread m"));
}

#[test]
fn failing_configure_fails_the_build() {
  let env = TestEnv::from_fixture("linux.toml").with_fake_toolchain();
  env.write_file("content/cairo-1.15.14/configure", "echo 'no pixman' >&2\nexit 1\n");
  let status = std::process::Command::new("tar")
    .arg("-cJf")
    .arg(env.path().join("cairo-1.15.14.tar.xz"))
    .arg("-C")
    .arg(env.path().join("content"))
    .arg("cairo-1.15.14")
    .status()
    .unwrap();
  assert!(status.success());

  let output = env.recipe_cmd("build").arg("--output").arg("json").output().unwrap();

  assert!(!output.status.success());
  let value: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["error"]["kind"], "ToolInvocationError");
  assert!(value["error"]["message"].as_str().unwrap().contains("no pixman"));
  assert!(env.make_log().is_empty());
}

#[test]
fn missing_dependency_root_fails_before_download() {
  let env = TestEnv::from_fixture("msvc.toml");

  env
    .recipe_cmd("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("dependency 'zlib' is required"));
  assert!(!env.root_path().join("downloads").join("cairo-1.15.14.tar.xz").exists());
}
