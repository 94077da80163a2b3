//! `stacktmpl check`: listing specs without a provider.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn check_lists_specs() {
  let env = TestEnv::new();
  env.add_spec("nginx", "x", Some("nginx -s reload"));
  env.add_spec("haproxy", "y", None);

  env
    .stacktmpl_cmd()
    .arg("check")
    .assert()
    .success()
    .stdout(predicate::str::contains("2 render spec(s) loaded"))
    .stdout(predicate::str::contains("nginx.conf"))
    .stdout(predicate::str::contains("nginx -s reload"));
}

#[test]
fn check_json_shows_seeded_digest() {
  let env = TestEnv::new();
  let existing = env.add_spec("existing", "x", None);
  std::fs::write(&existing, "rendered before").unwrap();
  env.add_spec("fresh", "y", None);

  let output = env
    .stacktmpl_cmd()
    .args(["check", "--output", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let specs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(specs.as_array().unwrap().len(), 2);
  assert!(specs[0]["digest"].is_string());
  assert!(specs[1]["digest"].is_null());
  assert!(specs[1]["action"].is_null());
}

#[test]
fn check_skips_invalid_specs() {
  let env = TestEnv::new();
  env.add_spec("good", "x", None);
  std::fs::write(env.path().join("bad.yml"), "destination: /tmp/nowhere\n").unwrap();

  env
    .stacktmpl_cmd()
    .arg("check")
    .assert()
    .success()
    .stdout(predicate::str::contains("1 render spec(s) loaded"));
}

#[test]
fn templates_flag_overrides_env() {
  let env = TestEnv::new();
  env.add_spec("good", "x", None);
  let empty = TestEnv::new();

  env
    .stacktmpl_cmd()
    .arg("check")
    .arg("--templates")
    .arg(empty.pattern())
    .assert()
    .failure();
}
