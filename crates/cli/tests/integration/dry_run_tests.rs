//! Dry-run integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn dry_run_needs_only_output_dir() {
  let env = TestEnv::empty();
  env.site_dir("blog");

  env
    .hedgerules_cmd()
    .args(["deploy", "--dry-run", "--output-dir", "public"])
    .assert()
    .success()
    .stdout(predicate::str::contains("=== Redirects ==="))
    .stdout(predicate::str::contains("/blog -> /blog/"))
    .stderr(predicate::str::contains("Dry run complete. No changes made."));
}

#[test]
fn dry_run_prints_resolved_redirects_and_headers() {
  let env = TestEnv::with_config();
  env.site_dir("docs");
  env.write_file("public/_hedge_redirects.txt", "/old /docs 301\n/legacy /old\n");
  env.write_file(
    "public/_hedge_headers.json",
    r#"{ "/": { "X-Frame-Options": "DENY", "Cache-Control": "no-cache" } }"#,
  );

  env
    .hedgerules_cmd()
    .args(["deploy", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("/legacy -> /docs/"))
    .stdout(predicate::str::contains("/old -> /docs/"))
    .stdout(predicate::str::contains(
      "/:\nCache-Control: no-cache\nX-Frame-Options: DENY\n---",
    ))
    .stderr(predicate::str::contains("Redirects: 3 keys"));
}

#[test]
fn dry_run_writes_nothing() {
  let env = TestEnv::with_config();
  env.site_dir("blog");

  env.hedgerules_cmd().args(["deploy", "--dry-run"]).assert().success();

  assert!(env.edge().stores().unwrap().is_empty());
}

#[test]
fn dry_run_json_output() {
  let env = TestEnv::with_config();
  env.site_dir("blog");

  let output = env
    .hedgerules_cmd()
    .args(["deploy", "--dry-run", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["redirects"][0]["key"], "/blog");
  assert_eq!(json["redirects"][0]["value"], "/blog/");
  assert_eq!(json["headers"].as_array().map(Vec::len), Some(0));
}

#[test]
fn cycle_fails() {
  let env = TestEnv::with_config();
  env.write_file("public/_hedge_redirects.txt", "/a /b\n/b /a\n");

  env
    .hedgerules_cmd()
    .args(["deploy", "--dry-run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("redirect cycle detected"));
}

#[test]
fn oversized_key_lists_validation_errors() {
  let env = TestEnv::with_config();
  let long = format!("/{}", "x".repeat(600));
  env.write_file("public/_hedge_redirects.txt", &format!("{} /dest/\n", long));

  env
    .hedgerules_cmd()
    .args(["deploy", "--dry-run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Validation errors:"))
    .stderr(predicate::str::contains("key exceeds 512 bytes"));
}

#[test]
fn malformed_declaration_is_skipped_with_warning() {
  let env = TestEnv::with_config();
  env.write_file("public/_hedge_redirects.txt", "/ok /fine/\njust-one-field\n");

  env
    .hedgerules_cmd()
    .args(["deploy", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("/ok -> /fine/"))
    .stderr(predicate::str::contains("Skipped 1 invalid redirect declaration"));
}

#[test]
fn invalid_headers_json_fails() {
  let env = TestEnv::with_config();
  env.write_file("public/_hedge_headers.json", "{not json");

  env
    .hedgerules_cmd()
    .args(["deploy", "--dry-run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("_hedge_headers.json"));
}
