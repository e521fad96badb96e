//! Diff command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn diff_before_first_deploy() {
  let env = TestEnv::with_config();
  env.create_stores();
  env.site_dir("blog");

  env
    .hedgerules_cmd()
    .arg("diff")
    .assert()
    .success()
    .stdout(predicate::str::contains("site-redirects"))
    .stdout(predicate::str::contains("1 put(s), 0 delete(s)"))
    .stdout(predicate::str::contains("site-viewer-request (create)"))
    .stdout(predicate::str::contains("site-viewer-response (create)"));

  assert!(env.store_items("site-redirects").is_empty());
}

#[test]
fn diff_after_deploy_is_clean() {
  let env = TestEnv::with_config();
  env.create_stores();
  env.site_dir("blog");
  env.hedgerules_cmd().arg("deploy").assert().success();

  env
    .hedgerules_cmd()
    .arg("diff")
    .assert()
    .success()
    .stdout(predicate::str::contains("Stores are up to date"))
    .stdout(predicate::str::contains("site-viewer-request (update)"));
}

#[test]
fn diff_shows_deletes() {
  let env = TestEnv::with_config();
  env.create_stores();
  env.site_dir("gone");
  env.hedgerules_cmd().arg("deploy").assert().success();
  std::fs::remove_dir(env.site_path().join("gone")).unwrap();

  let output = env
    .hedgerules_cmd()
    .args(["diff", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let preview: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(preview["redirects"]["plan"]["deletes"][0], "/gone");
  assert_eq!(preview["redirects"]["plan"]["puts"].as_array().map(Vec::len), Some(0));
  // diff never writes
  assert!(env.store_items("site-redirects").contains_key("/gone"));
}
