//! Deploy command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn deploy_populates_stores_and_publishes_functions() {
  let env = TestEnv::with_config();
  env.create_stores();
  env.site_dir("blog");
  env.write_file("public/_hedge_redirects.txt", "/old /blog\n");
  env.write_file("public/_hedge_headers.json", r#"{ "/": { "X-Frame-Options": "DENY" } }"#);

  env
    .hedgerules_cmd()
    .arg("deploy")
    .assert()
    .success()
    .stdout(predicate::str::contains("Deploy complete."));

  let redirects = env.store_items("site-redirects");
  assert_eq!(redirects.get("/blog").map(String::as_str), Some("/blog/"));
  assert_eq!(redirects.get("/old").map(String::as_str), Some("/blog/"));

  let headers = env.store_items("site-headers");
  assert_eq!(headers.get("/").map(String::as_str), Some("X-Frame-Options: DENY"));

  let request = env.live_code("site-viewer-request").unwrap();
  assert!(request.starts_with("var kvsId = 'arn:hedgerules:local:key-value-store/"));
  assert!(!request.contains("var debugHeaders"));

  let response = env.live_code("site-viewer-response").unwrap();
  assert!(response.contains("var debugHeaders = false;"));
}

#[test]
fn redeploy_is_idempotent_for_stores() {
  let env = TestEnv::with_config();
  env.create_stores();
  env.site_dir("blog");

  env.hedgerules_cmd().arg("deploy").assert().success();

  let output = env
    .hedgerules_cmd()
    .args(["deploy", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["redirects"]["batches"], 0);
  assert_eq!(report["headers"]["batches"], 0);
  assert_eq!(report["request_function"]["change"], "updated");
  assert_eq!(report["response_function"]["change"], "updated");
}

#[test]
fn removed_directories_are_deleted_from_store() {
  let env = TestEnv::with_config();
  env.create_stores();
  env.site_dir("keep");
  env.site_dir("gone");
  env.hedgerules_cmd().arg("deploy").assert().success();
  assert!(env.store_items("site-redirects").contains_key("/gone"));

  std::fs::remove_dir(env.site_path().join("gone")).unwrap();
  env.hedgerules_cmd().arg("deploy").assert().success();

  let redirects = env.store_items("site-redirects");
  assert!(redirects.contains_key("/keep"));
  assert!(!redirects.contains_key("/gone"));
}

#[test]
fn large_site_is_written_in_batches() {
  let env = TestEnv::with_config();
  env.create_stores();
  for i in 0..120 {
    env.site_dir(&format!("page{:03}", i));
  }

  let output = env
    .hedgerules_cmd()
    .args(["deploy", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["redirects"]["puts"], 120);
  assert_eq!(report["redirects"]["batches"], 3);
  assert_eq!(env.store_items("site-redirects").len(), 120);
}

#[test]
fn debug_headers_flag_reaches_response_function() {
  let env = TestEnv::with_config();
  env.create_stores();

  env
    .hedgerules_cmd()
    .args(["deploy", "--debug-headers"])
    .assert()
    .success();

  let response = env.live_code("site-viewer-response").unwrap();
  assert!(response.contains("var debugHeaders = true;"));
}

#[test]
fn flags_override_config_names() {
  let env = TestEnv::with_config();
  env.create_stores();
  env
    .hedgerules_cmd()
    .args(["store", "create", "other-headers"])
    .assert()
    .success();

  env
    .hedgerules_cmd()
    .args(["deploy", "--headers-kvs-name", "other-headers"])
    .assert()
    .success();

  let other_id = env
    .edge()
    .stores()
    .unwrap()
    .into_iter()
    .find(|s| s.name == "other-headers")
    .unwrap()
    .id;
  let response = env.live_code("site-viewer-response").unwrap();
  assert!(response.contains(&other_id));
}

#[test]
fn missing_store_fails_without_writing() {
  let env = TestEnv::with_config();
  env.hedgerules_cmd().args(["store", "create", "site-redirects"]).assert().success();
  env.site_dir("blog");

  env
    .hedgerules_cmd()
    .arg("deploy")
    .assert()
    .failure()
    .stderr(predicate::str::contains("key value store not found: site-headers"));

  assert!(env.store_items("site-redirects").is_empty());
  assert!(env.live_code("site-viewer-request").is_none());
}
