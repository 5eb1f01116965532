//! `resolve` and `graph` integration tests.

use predicates::prelude::*;
use serde_json::Value;

use super::common::TestEnv;

fn json_stdout(cmd: &mut assert_cmd::Command) -> Value {
  let output = cmd.arg("--output").arg("json").output().unwrap();
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  serde_json::from_slice(&output.stdout).unwrap()
}

fn names(specs: &Value) -> Vec<String> {
  specs
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["name"].as_str().unwrap().to_string())
    .collect()
}

#[test]
fn linux_defaults() {
  let env = TestEnv::from_fixture("linux.toml");

  let value = json_stdout(&mut env.recipe_cmd("resolve"));

  let values = &value["config"]["values"];
  assert_eq!(values["shared"], false);
  assert_eq!(values["fPIC"], true);
  assert_eq!(values["enable_xlib"], true);
  assert_eq!(value["config"]["pruned"].as_array().unwrap().len(), 0);
  assert_eq!(value["hash"].as_str().unwrap().len(), 20);
  let work_dir = value["work_dir"].as_str().unwrap();
  assert!(work_dir.starts_with(env.root_path().join("work").to_str().unwrap()));
}

#[test]
fn command_line_overrides_change_the_work_dir() {
  let env = TestEnv::from_fixture("linux.toml");

  let default = json_stdout(&mut env.recipe_cmd("resolve"));
  let shared = json_stdout(env.recipe_cmd("resolve").arg("-o").arg("shared=true"));

  assert_eq!(shared["config"]["values"]["shared"], true);
  assert_ne!(default["work_dir"], shared["work_dir"]);
}

#[test]
fn explicit_work_dir_wins_over_environment() {
  let env = TestEnv::from_fixture("linux.toml");
  let elsewhere = env.path().join("elsewhere");

  let value = json_stdout(env.recipe_cmd("resolve").arg("--work-dir").arg(&elsewhere));

  assert!(value["work_dir"].as_str().unwrap().contains("elsewhere"));
}

#[test]
fn macos_prunes_x11_backends() {
  let env = TestEnv::from_fixture("macos.toml");

  env
    .recipe_cmd("resolve")
    .assert()
    .success()
    .stdout(predicate::str::contains("aarch64-macos"))
    .stdout(predicate::str::contains("enable_xlib (not available on macos)"));
}

#[test]
fn msvc_prunes_fpic() {
  let env = TestEnv::from_fixture("msvc.toml");

  let value = json_stdout(&mut env.recipe_cmd("resolve"));

  let pruned: Vec<&str> = value["config"]["pruned"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v.as_str().unwrap())
    .collect();
  assert_eq!(pruned, vec!["enable_fc", "enable_ft", "enable_xcb", "enable_xlib", "fPIC"]);
  assert!(value["config"]["values"].get("enable_ft").is_none());
}

#[test]
fn unsupported_override_is_reported() {
  let env = TestEnv::from_fixture("msvc.toml");

  env
    .recipe_cmd("resolve")
    .arg("-o")
    .arg("fPIC=true")
    .assert()
    .failure()
    .stderr(predicate::str::contains("fPIC"));
}

#[test]
fn unknown_profile_option_is_an_invalid_option() {
  let env = TestEnv::from_fixture("bad-option.toml");

  let output = env.recipe_cmd("resolve").arg("--output").arg("json").output().unwrap();

  assert!(!output.status.success());
  let value: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["error"]["kind"], "InvalidOption");
  assert!(value["error"]["message"].as_str().unwrap().contains("enable_cheese"));
}

#[test]
fn linux_graph_in_link_order() {
  let env = TestEnv::from_fixture("linux.toml");

  let graph = json_stdout(&mut env.recipe_cmd("graph"));

  assert_eq!(
    names(&graph["requires"]),
    vec!["zlib", "pixman", "libpng", "freetype", "fontconfig", "xorg", "glib"]
  );
  assert_eq!(names(&graph["tool_requires"]), vec!["pkgconf"]);
}

#[test]
fn disabling_fontconfig_drops_it_from_the_graph() {
  let env = TestEnv::from_fixture("linux.toml");

  let graph = json_stdout(env.recipe_cmd("graph").args(["-o", "enable_fc=false", "-o", "enable_ft=true"]));

  let requires = names(&graph["requires"]);
  assert!(requires.contains(&"freetype".to_string()));
  assert!(!requires.contains(&"fontconfig".to_string()));
}

#[test]
fn msvc_graph_text() {
  let env = TestEnv::from_fixture("msvc.toml");

  env
    .recipe_cmd("graph")
    .assert()
    .success()
    .stdout(predicate::str::contains("zlib/1.2.11"))
    .stdout(predicate::str::contains("7zip/19.0.0"))
    .stdout(predicate::str::contains("fontconfig").not())
    .stdout(predicate::str::contains("freetype").not())
    .stdout(predicate::str::contains("glib").not());
}
