//! Readers for the static-site output directory.
//!
//! # Layout
//!
//! ```text
//! {output_dir}/
//! ├── _hedge_redirects.txt   # optional explicit redirects
//! ├── _hedge_headers.json    # optional per-path headers
//! └── <subdirectories>       # each yields a /dir -> /dir/ redirect
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts::{HEADERS_FILENAME, REDIRECTS_FILENAME};
use crate::headers::{HeaderDeclarations, collect_headers};
use crate::kvs::{Dataset, Entry};
use crate::redirects::{ParsedRedirects, parse_declarations};

/// Errors reading site inputs.
#[derive(Debug, Error)]
pub enum SiteError {
  /// The output directory does not exist or cannot be inspected.
  #[error("failed to stat output directory {path}: {source}")]
  Stat {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The output path exists but is not a directory.
  #[error("output directory is not a directory: {0}")]
  NotADirectory(PathBuf),

  /// Walking the output tree failed.
  #[error("failed to walk output directory: {0}")]
  Walk(#[from] walkdir::Error),

  /// An input file exists but could not be read.
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The header declarations file is not valid JSON of the expected shape.
  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Create a `/dir -> /dir/` redirect for every directory below `output_dir`.
///
/// The root itself is skipped. Entries are sorted by key.
pub fn scan_directories(output_dir: &Path) -> Result<Dataset, SiteError> {
  let metadata = fs::metadata(output_dir).map_err(|source| SiteError::Stat {
    path: output_dir.to_path_buf(),
    source,
  })?;
  if !metadata.is_dir() {
    return Err(SiteError::NotADirectory(output_dir.to_path_buf()));
  }

  let mut entries = Dataset::new();
  for entry in WalkDir::new(output_dir).min_depth(1).sort_by_file_name() {
    let entry = entry?;
    if !entry.file_type().is_dir() {
      continue;
    }

    let Ok(rel) = entry.path().strip_prefix(output_dir) else {
      continue;
    };
    let url_path = rel
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .fold(String::new(), |acc, segment| format!("{}/{}", acc, segment));

    entries.insert(Entry::new(url_path.clone(), url_path + "/"));
  }

  info!(dir = %output_dir.display(), count = entries.len(), "scanned directory redirects");
  Ok(entries.sorted())
}

/// Read explicit redirect declarations. A missing file yields no redirects.
pub fn read_redirects(output_dir: &Path) -> Result<ParsedRedirects, SiteError> {
  let path = output_dir.join(REDIRECTS_FILENAME);
  let Some(content) = read_optional(&path)? else {
    debug!(path = %path.display(), "no redirect declarations");
    return Ok(ParsedRedirects::default());
  };

  let parsed = parse_declarations(&content);
  info!(
    path = %path.display(),
    count = parsed.entries.len(),
    skipped = parsed.skipped.len(),
    "parsed redirect declarations"
  );
  Ok(parsed)
}

/// Read per-path header declarations. A missing file yields no headers.
pub fn read_headers(output_dir: &Path) -> Result<Dataset, SiteError> {
  let path = output_dir.join(HEADERS_FILENAME);
  let Some(content) = read_optional(&path)? else {
    debug!(path = %path.display(), "no header declarations");
    return Ok(Dataset::new());
  };

  let declarations: HeaderDeclarations =
    serde_json::from_str(&content).map_err(|source| SiteError::Parse { path: path.clone(), source })?;

  let headers = collect_headers(&declarations);
  info!(path = %path.display(), count = headers.len(), "parsed header declarations");
  Ok(headers)
}

fn read_optional(path: &Path) -> Result<Option<String>, SiteError> {
  match fs::read_to_string(path) {
    Ok(content) => Ok(Some(content)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(source) => Err(SiteError::Read {
      path: path.to_path_buf(),
      source,
    }),
  }
}
