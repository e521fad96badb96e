//! Directory-backed edge provider.
//!
//! Emulates the remote store and function APIs on the local filesystem so the
//! full deploy pipeline can run without network access.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! ├── kvs/
//! │   └── {store-name}.json       # id, revision, etag, items
//! └── functions/
//!     └── {function-name}.json    # config, development and live code, etag
//! ```
//!
//! Every write bumps a revision counter and derives a new ETag from the
//! resource name, revision and content. Conditional writes compare the
//! presented ETag against the stored one and fail with
//! [`RemoteError::Conflict`] on mismatch. Files are replaced atomically
//! (write to temp, then rename).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::function::{FunctionClient, FunctionConfig, FunctionDescription, FunctionStage};
use crate::kvs::{Entry, KvsClient, Page, RemoteError, StoreDescription, StoreSummary, VersionToken};
use crate::util::hash::{hash_bytes, hash_parts};

const DEFAULT_PAGE_SIZE: usize = 50;
const STORE_ID_PREFIX: &str = "arn:hedgerules:local:key-value-store/";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
  id: String,
  revision: u64,
  etag: VersionToken,
  items: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionFile {
  config: FunctionConfig,
  revision: u64,
  etag: VersionToken,
  development: String,
  live: Option<String>,
}

/// Edge provider persisting state under a root directory.
#[derive(Debug, Clone)]
pub struct LocalEdge {
  root: PathBuf,
  page_size: usize,
}

impl LocalEdge {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn stores_dir(&self) -> PathBuf {
    self.root.join("kvs")
  }

  fn functions_dir(&self) -> PathBuf {
    self.root.join("functions")
  }

  fn store_path(&self, name: &str) -> PathBuf {
    self.stores_dir().join(format!("{}.json", name))
  }

  fn function_path(&self, name: &str) -> PathBuf {
    self.functions_dir().join(format!("{}.json", name))
  }

  /// Create an empty store. Fails if a store with that name exists.
  pub fn create_store(&self, name: &str) -> Result<StoreSummary, RemoteError> {
    check_name("create key value store", name)?;
    let path = self.store_path(name);
    if path.exists() {
      return Err(RemoteError::Rejected {
        operation: "create key value store",
        message: format!("key value store already exists: {}", name),
      });
    }

    let id = format!("{}{}", STORE_ID_PREFIX, hash_bytes(name.as_bytes()).short());
    let items = BTreeMap::new();
    let file = StoreFile {
      etag: store_etag(name, 1, &items)?,
      id: id.clone(),
      revision: 1,
      items,
    };
    write_json(&path, &file)?;
    debug!(store = %name, id = %id, "created local store");

    Ok(StoreSummary {
      name: name.to_string(),
      id,
    })
  }

  /// All stores, sorted by name.
  pub fn stores(&self) -> Result<Vec<StoreSummary>, RemoteError> {
    let dir = self.stores_dir();
    let read_dir = match fs::read_dir(&dir) {
      Ok(read_dir) => read_dir,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut stores = Vec::new();
    for entry in read_dir {
      let path = entry?.path();
      if path.extension().and_then(|e| e.to_str()) != Some("json") {
        continue;
      }
      let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
        continue;
      };
      let file: StoreFile = read_json(&path)?;
      stores.push(StoreSummary {
        name: name.to_string(),
        id: file.id,
      });
    }
    stores.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(stores)
  }

  /// Contents of a store by name.
  pub fn store_items(&self, name: &str) -> Result<BTreeMap<String, String>, RemoteError> {
    let path = self.store_path(name);
    if !path.exists() {
      return Err(not_found_store(name));
    }
    let file: StoreFile = read_json(&path)?;
    Ok(file.items)
  }

  /// Code of a function in `stage`, if it exists there.
  pub fn function_code(&self, name: &str, stage: FunctionStage) -> Result<Option<String>, RemoteError> {
    let Some(file) = self.load_function(name)? else {
      return Ok(None);
    };
    Ok(match stage {
      FunctionStage::Development => Some(file.development),
      FunctionStage::Live => file.live,
    })
  }

  fn find_store(&self, store_id: &str) -> Result<(PathBuf, StoreFile), RemoteError> {
    for summary in self.stores()? {
      if summary.id == store_id {
        let path = self.store_path(&summary.name);
        let file = read_json(&path)?;
        return Ok((path, file));
      }
    }
    Err(not_found_store(store_id))
  }

  fn load_function(&self, name: &str) -> Result<Option<FunctionFile>, RemoteError> {
    check_name("describe function", name)?;
    let path = self.function_path(name);
    if !path.exists() {
      return Ok(None);
    }
    read_json(&path).map(Some)
  }

  fn save_function(&self, name: &str, mut file: FunctionFile) -> Result<VersionToken, RemoteError> {
    file.revision += 1;
    file.etag = function_etag(name, &file)?;
    write_json(&self.function_path(name), &file)?;
    Ok(file.etag)
  }
}

fn not_found_store(name: &str) -> RemoteError {
  RemoteError::NotFound {
    kind: "key value store",
    name: name.to_string(),
  }
}

fn not_found_function(name: &str) -> RemoteError {
  RemoteError::NotFound {
    kind: "function",
    name: name.to_string(),
  }
}

/// Names become file names, so only `[A-Za-z0-9_-]` is accepted.
fn check_name(operation: &'static str, name: &str) -> Result<(), RemoteError> {
  let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
  if valid {
    Ok(())
  } else {
    Err(RemoteError::Rejected {
      operation,
      message: format!("invalid resource name: {:?}", name),
    })
  }
}

fn check_etag(resource: &str, current: &VersionToken, if_match: &VersionToken) -> Result<(), RemoteError> {
  if current == if_match {
    Ok(())
  } else {
    Err(RemoteError::Conflict {
      resource: resource.to_string(),
      expected: if_match.clone(),
    })
  }
}

fn store_etag(name: &str, revision: u64, items: &BTreeMap<String, String>) -> Result<VersionToken, RemoteError> {
  let content = serde_json::to_vec(items)?;
  let hash = hash_parts([name.as_bytes(), &revision.to_le_bytes()[..], content.as_slice()]);
  Ok(VersionToken::new(format!("E{}", hash.short().to_uppercase())))
}

fn function_etag(name: &str, file: &FunctionFile) -> Result<VersionToken, RemoteError> {
  let config = serde_json::to_vec(&file.config)?;
  let live = file.live.as_deref().unwrap_or_default();
  let hash = hash_parts([
    name.as_bytes(),
    &file.revision.to_le_bytes()[..],
    config.as_slice(),
    file.development.as_bytes(),
    live.as_bytes(),
  ]);
  Ok(VersionToken::new(format!("E{}", hash.short().to_uppercase())))
}

fn decode_code(code: &[u8]) -> Result<String, RemoteError> {
  String::from_utf8(code.to_vec()).map_err(|_| RemoteError::Rejected {
    operation: "upload function code",
    message: "function code must be valid UTF-8".to_string(),
  })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RemoteError> {
  let content = fs::read_to_string(path)?;
  Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RemoteError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let content = serde_json::to_string_pretty(value)?;
  let temp_path = path.with_extension("json.tmp");
  fs::write(&temp_path, &content)?;
  fs::rename(&temp_path, path)?;
  Ok(())
}

fn page_of<T: Clone>(items: &[T], marker: Option<&str>, page_size: usize) -> Result<Page<T>, RemoteError> {
  let start = match marker {
    Some(m) => m.parse::<usize>().map_err(|_| RemoteError::Rejected {
      operation: "list",
      message: format!("invalid pagination token: {}", m),
    })?,
    None => 0,
  };
  let end = (start + page_size).min(items.len());
  let slice = items.get(start..end).unwrap_or_default();
  Ok(Page {
    items: slice.to_vec(),
    next: (end < items.len()).then(|| end.to_string()),
  })
}

impl KvsClient for LocalEdge {
  async fn list_stores(&self, marker: Option<&str>) -> Result<Page<StoreSummary>, RemoteError> {
    page_of(&self.stores()?, marker, self.page_size)
  }

  async fn describe_store(&self, store_id: &str) -> Result<StoreDescription, RemoteError> {
    let (_, file) = self.find_store(store_id)?;
    Ok(StoreDescription {
      id: file.id,
      version: file.etag,
      item_count: file.items.len(),
    })
  }

  async fn list_keys(&self, store_id: &str, next: Option<&str>) -> Result<Page<Entry>, RemoteError> {
    let (_, file) = self.find_store(store_id)?;
    let items: Vec<_> = file.items.into_iter().map(|(k, v)| Entry::new(k, v)).collect();
    page_of(&items, next, self.page_size)
  }

  async fn update_keys(
    &self,
    store_id: &str,
    if_match: &VersionToken,
    puts: &[Entry],
    deletes: &[String],
  ) -> Result<VersionToken, RemoteError> {
    let (path, mut file) = self.find_store(store_id)?;
    check_etag(store_id, &file.etag, if_match)?;

    for entry in puts {
      file.items.insert(entry.key.clone(), entry.value.clone());
    }
    for key in deletes {
      file.items.remove(key);
    }

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
    file.revision += 1;
    file.etag = store_etag(&name, file.revision, &file.items)?;
    write_json(&path, &file)?;

    debug!(store = %name, puts = puts.len(), deletes = deletes.len(), etag = %file.etag, "updated local store");
    Ok(file.etag)
  }
}

impl FunctionClient for LocalEdge {
  async fn describe_function(&self, name: &str, stage: FunctionStage) -> Result<FunctionDescription, RemoteError> {
    let file = self.load_function(name)?.ok_or_else(|| not_found_function(name))?;
    if stage == FunctionStage::Live && file.live.is_none() {
      return Err(not_found_function(name));
    }
    Ok(FunctionDescription {
      name: name.to_string(),
      stage,
      version: file.etag,
    })
  }

  async fn create_function(
    &self,
    name: &str,
    config: &FunctionConfig,
    code: &[u8],
  ) -> Result<VersionToken, RemoteError> {
    check_name("create function", name)?;
    if self.function_path(name).exists() {
      return Err(RemoteError::Rejected {
        operation: "create function",
        message: format!("function already exists: {}", name),
      });
    }

    let file = FunctionFile {
      config: config.clone(),
      revision: 0,
      etag: VersionToken::new(""),
      development: decode_code(code)?,
      live: None,
    };
    let etag = self.save_function(name, file)?;
    debug!(function = %name, etag = %etag, "created local function");
    Ok(etag)
  }

  async fn update_function(
    &self,
    name: &str,
    if_match: &VersionToken,
    config: &FunctionConfig,
    code: &[u8],
  ) -> Result<VersionToken, RemoteError> {
    let mut file = self.load_function(name)?.ok_or_else(|| not_found_function(name))?;
    check_etag(name, &file.etag, if_match)?;

    file.config = config.clone();
    file.development = decode_code(code)?;
    let etag = self.save_function(name, file)?;
    debug!(function = %name, etag = %etag, "updated local function");
    Ok(etag)
  }

  async fn publish_function(&self, name: &str, if_match: &VersionToken) -> Result<VersionToken, RemoteError> {
    let mut file = self.load_function(name)?.ok_or_else(|| not_found_function(name))?;
    check_etag(name, &file.etag, if_match)?;

    file.live = Some(file.development.clone());
    let etag = self.save_function(name, file)?;
    debug!(function = %name, etag = %etag, "published local function");
    Ok(etag)
  }
}
