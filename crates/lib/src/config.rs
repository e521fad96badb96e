//! `hedgerules.toml` loading and command-line overrides.
//!
//! ```toml
//! output-dir = "public"
//!
//! [redirects]
//! kvs-name = "site-redirects"
//!
//! [headers]
//! kvs-name = "site-headers"
//!
//! [functions]
//! request-name = "site-viewer-request"
//! response-name = "site-viewer-response"
//! debug-headers = false
//! ```
//!
//! Every key is optional in the file. Flags override file values, and empty
//! strings count as unset.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::deploy::DeployTargets;
use crate::platform::paths::default_state_dir;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// A required setting has no value from either the file or a flag.
  #[error("{key} is required (set in config file or via --{flag})")]
  Missing { key: &'static str, flag: &'static str },

  #[error("cannot determine local state directory (set provider.state-dir or --state-dir)")]
  NoStateDir,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
  pub output_dir: Option<PathBuf>,
  pub region: Option<String>,
  pub redirects: StoreSection,
  pub headers: StoreSection,
  pub functions: FunctionsSection,
  pub provider: ProviderSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StoreSection {
  pub kvs_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FunctionsSection {
  pub request_name: Option<String>,
  pub response_name: Option<String>,
  pub debug_headers: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProviderSection {
  pub state_dir: Option<PathBuf>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub output_dir: Option<PathBuf>,
  pub region: Option<String>,
  pub redirects_kvs_name: Option<String>,
  pub headers_kvs_name: Option<String>,
  pub request_function_name: Option<String>,
  pub response_function_name: Option<String>,
  /// Only ever turns debug headers on.
  pub debug_headers: bool,
  pub state_dir: Option<PathBuf>,
}

impl Config {
  /// Load a config file. A missing file yields the default config.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
  }

  /// Apply command-line overrides on top of file values.
  pub fn with_overrides(mut self, overrides: Overrides) -> Self {
    fn set<T>(slot: &mut Option<T>, value: Option<T>) {
      if value.is_some() {
        *slot = value;
      }
    }

    set(&mut self.output_dir, overrides.output_dir);
    set(&mut self.region, overrides.region);
    set(&mut self.redirects.kvs_name, overrides.redirects_kvs_name);
    set(&mut self.headers.kvs_name, overrides.headers_kvs_name);
    set(&mut self.functions.request_name, overrides.request_function_name);
    set(&mut self.functions.response_name, overrides.response_function_name);
    set(&mut self.provider.state_dir, overrides.state_dir);
    self.functions.debug_headers |= overrides.debug_headers;
    self
  }

  pub fn output_dir(&self) -> Result<&Path, ConfigError> {
    self
      .output_dir
      .as_deref()
      .filter(|p| !p.as_os_str().is_empty())
      .ok_or(ConfigError::Missing {
        key: "output-dir",
        flag: "output-dir",
      })
  }

  /// Remote resource names, all of which must be set.
  pub fn targets(&self) -> Result<DeployTargets, ConfigError> {
    Ok(DeployTargets {
      redirects_store: required(&self.redirects.kvs_name, "redirects-kvs-name")?,
      headers_store: required(&self.headers.kvs_name, "headers-kvs-name")?,
      request_function: required(&self.functions.request_name, "request-function-name")?,
      response_function: required(&self.functions.response_name, "response-function-name")?,
      debug_headers: self.functions.debug_headers,
    })
  }

  /// Root of the local edge provider.
  pub fn state_dir(&self) -> Result<PathBuf, ConfigError> {
    match &self.provider.state_dir {
      Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.clone()),
      _ => default_state_dir().ok_or(ConfigError::NoStateDir),
    }
  }
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
  value
    .as_deref()
    .filter(|v| !v.is_empty())
    .map(str::to_string)
    .ok_or(ConfigError::Missing { key, flag: key })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const FULL: &str = r#"
output-dir = "public"
region = "us-east-1"

[redirects]
kvs-name = "site-redirects"

[headers]
kvs-name = "site-headers"

[functions]
request-name = "site-request"
response-name = "site-response"
debug-headers = true
"#;

  #[test]
  fn missing_file_is_default() {
    let temp = TempDir::new().unwrap();
    let config = Config::load(&temp.path().join("hedgerules.toml")).unwrap();
    assert_eq!(config, Config::default());
  }

  #[test]
  fn parses_kebab_case_keys() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("hedgerules.toml");
    fs::write(&path, FULL).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.output_dir().unwrap(), Path::new("public"));
    assert_eq!(config.region.as_deref(), Some("us-east-1"));

    let targets = config.targets().unwrap();
    assert_eq!(targets.redirects_store, "site-redirects");
    assert_eq!(targets.headers_store, "site-headers");
    assert_eq!(targets.request_function, "site-request");
    assert_eq!(targets.response_function, "site-response");
    assert!(targets.debug_headers);
  }

  #[test]
  fn invalid_toml_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("hedgerules.toml");
    fs::write(&path, "output-dir = [").unwrap();
    assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
  }

  #[test]
  fn flags_override_file_values() {
    let config: Config = toml::from_str(FULL).unwrap();
    let config = config.with_overrides(Overrides {
      output_dir: Some(PathBuf::from("dist")),
      headers_kvs_name: Some("other-headers".to_string()),
      ..Overrides::default()
    });

    assert_eq!(config.output_dir().unwrap(), Path::new("dist"));
    let targets = config.targets().unwrap();
    assert_eq!(targets.headers_store, "other-headers");
    assert_eq!(targets.redirects_store, "site-redirects");
  }

  #[test]
  fn debug_flag_only_turns_on() {
    let config = Config::default().with_overrides(Overrides {
      debug_headers: true,
      ..Overrides::default()
    });
    assert!(config.functions.debug_headers);

    let config: Config = toml::from_str(FULL).unwrap();
    let config = config.with_overrides(Overrides::default());
    assert!(config.functions.debug_headers);
  }

  #[test]
  fn missing_output_dir_names_the_flag() {
    let err = Config::default().output_dir().unwrap_err();
    assert_eq!(
      err.to_string(),
      "output-dir is required (set in config file or via --output-dir)"
    );
  }

  #[test]
  fn empty_names_count_as_missing() {
    let config: Config = toml::from_str(
      r#"
output-dir = "public"
[redirects]
kvs-name = ""
"#,
    )
    .unwrap();
    let err = config.targets().unwrap_err();
    assert!(matches!(
      err,
      ConfigError::Missing {
        key: "redirects-kvs-name",
        ..
      }
    ));
  }

  #[test]
  fn targets_report_first_missing_name() {
    let config = Config::default().with_overrides(Overrides {
      redirects_kvs_name: Some("r".to_string()),
      headers_kvs_name: Some("h".to_string()),
      ..Overrides::default()
    });
    let err = config.targets().unwrap_err();
    assert!(err.to_string().starts_with("request-function-name is required"));
  }

  #[test]
  fn explicit_state_dir_wins() {
    let config = Config::default().with_overrides(Overrides {
      state_dir: Some(PathBuf::from("/tmp/edge")),
      ..Overrides::default()
    });
    assert_eq!(config.state_dir().unwrap(), PathBuf::from("/tmp/edge"));
  }
}
