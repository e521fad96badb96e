use crate::consts::APP_NAME;
use std::path::PathBuf;

/// Overrides the local provider's state directory.
pub const STATE_DIR_ENV: &str = "HEDGERULES_STATE_DIR";

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").map(PathBuf::from)
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> Option<PathBuf> {
  std::env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join(APP_NAME))
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> Option<PathBuf> {
  let data_home = match std::env::var_os("XDG_DATA_HOME") {
    Some(dir) if !dir.is_empty() => PathBuf::from(dir),
    _ => home_dir()?.join(".local").join("share"),
  };
  Some(data_home.join(APP_NAME))
}

/// Default root of the local edge provider.
///
/// `HEDGERULES_STATE_DIR` wins; otherwise `{data_dir}/edge`.
pub fn default_state_dir() -> Option<PathBuf> {
  match std::env::var_os(STATE_DIR_ENV) {
    Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
    _ => data_dir().map(|dir| dir.join("edge")),
  }
}
