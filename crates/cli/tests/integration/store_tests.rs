//! Store command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn create_then_list() {
  let env = TestEnv::empty();

  env
    .hedgerules_cmd()
    .args(["store", "create", "site-redirects"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Created key value store site-redirects"));

  env
    .hedgerules_cmd()
    .args(["store", "list"])
    .assert()
    .success()
    .stdout(predicate::str::contains("site-redirects\tarn:hedgerules:local:key-value-store/"));
}

#[test]
fn create_twice_fails() {
  let env = TestEnv::empty();
  env.hedgerules_cmd().args(["store", "create", "s"]).assert().success();

  env
    .hedgerules_cmd()
    .args(["store", "create", "s"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("already exists"));
}

#[test]
fn state_dir_flag_overrides_environment() {
  let env = TestEnv::empty();
  let other = env.temp.path().join("other-state");

  env
    .hedgerules_cmd()
    .args(["store", "create", "s", "--state-dir"])
    .arg(&other)
    .assert()
    .success();

  assert!(other.join("kvs").join("s.json").exists());
  assert!(env.edge().stores().unwrap().is_empty());
}

#[test]
fn list_json() {
  let env = TestEnv::empty();
  env.hedgerules_cmd().args(["store", "create", "b"]).assert().success();
  env.hedgerules_cmd().args(["store", "create", "a"]).assert().success();

  let output = env
    .hedgerules_cmd()
    .args(["store", "list", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(list[0]["name"], "a");
  assert_eq!(list[1]["name"], "b");
}
