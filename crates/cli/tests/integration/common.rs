//! Shared test helpers for CLI integration tests.

use std::collections::BTreeMap;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use hedgerules_lib::function::FunctionStage;
use hedgerules_lib::provider::LocalEdge;
use tempfile::TempDir;

/// Config naming every remote resource, with the site under `public/`.
pub const CONFIG: &str = r#"
output-dir = "public"

[redirects]
kvs-name = "site-redirects"

[headers]
kvs-name = "site-headers"

[functions]
request-name = "site-viewer-request"
response-name = "site-viewer-response"
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the config file, the
/// site output and the local edge provider state.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create an empty test environment.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Environment with [`CONFIG`] and an empty site directory.
  pub fn with_config() -> Self {
    let env = Self::empty();
    env.write_file("hedgerules.toml", CONFIG);
    std::fs::create_dir_all(env.site_path()).unwrap();
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Create a directory below the site output.
  pub fn site_dir(&self, relative_path: &str) {
    std::fs::create_dir_all(self.site_path().join(relative_path)).unwrap();
  }

  /// Site output directory.
  pub fn site_path(&self) -> PathBuf {
    self.temp.path().join("public")
  }

  /// Local edge provider state.
  pub fn state_path(&self) -> PathBuf {
    let p = self.temp.path().join("state");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn edge(&self) -> LocalEdge {
    LocalEdge::new(self.state_path())
  }

  pub fn store_items(&self, name: &str) -> BTreeMap<String, String> {
    self.edge().store_items(name).unwrap()
  }

  pub fn live_code(&self, function: &str) -> Option<String> {
    self.edge().function_code(function, FunctionStage::Live).unwrap()
  }

  /// Create both stores named in [`CONFIG`].
  pub fn create_stores(&self) {
    for name in ["site-redirects", "site-headers"] {
      self.hedgerules_cmd().args(["store", "create", name]).assert().success();
    }
  }

  /// Get a pre-configured Command for the hedgerules binary.
  ///
  /// Runs inside the temp directory so the default config path resolves
  /// there, and points `HEDGERULES_STATE_DIR` at the isolated state path.
  pub fn hedgerules_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("hedgerules");
    cmd.current_dir(self.temp.path());
    cmd.env("HEDGERULES_STATE_DIR", self.state_path());
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
