//! In-memory edge provider.
//!
//! Records every call and can be told to fail specific operations, which is
//! what the store and function tests need to observe batching, token
//! threading and abort behavior.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::function::{FunctionClient, FunctionConfig, FunctionDescription, FunctionStage};
use crate::kvs::{Entry, KvsClient, Page, RemoteError, StoreDescription, StoreSummary, VersionToken};

const DEFAULT_PAGE_SIZE: usize = 50;

/// A call made against a [`MemoryEdge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  ListStores {
    marker: Option<String>,
  },
  DescribeStore {
    store: String,
  },
  ListKeys {
    store: String,
    next: Option<String>,
  },
  UpdateKeys {
    store: String,
    if_match: VersionToken,
    puts: Vec<Entry>,
    deletes: Vec<String>,
  },
  DescribeFunction {
    name: String,
    stage: FunctionStage,
  },
  CreateFunction {
    name: String,
    returned: VersionToken,
  },
  UpdateFunction {
    name: String,
    if_match: VersionToken,
    returned: VersionToken,
  },
  PublishFunction {
    name: String,
    if_match: VersionToken,
  },
}

#[derive(Debug)]
struct Store {
  id: String,
  items: BTreeMap<String, String>,
  history: Vec<VersionToken>,
}

impl Store {
  fn version(&self) -> &VersionToken {
    // history always holds the creation token
    &self.history[self.history.len() - 1]
  }
}

#[derive(Debug)]
struct Function {
  config: FunctionConfig,
  development: Vec<u8>,
  live: Option<Vec<u8>>,
  version: VersionToken,
}

#[derive(Debug, Default)]
struct State {
  etag_counter: u64,
  stores: BTreeMap<String, Store>,
  functions: BTreeMap<String, Function>,
  calls: Vec<Call>,
  update_keys_count: usize,
  fail_update_keys_at: Option<usize>,
  fail_publish: HashSet<String>,
  fail_describe: HashSet<String>,
}

impl State {
  fn next_etag(&mut self) -> VersionToken {
    self.etag_counter += 1;
    VersionToken::new(format!("etag-{}", self.etag_counter))
  }

  fn store_by_id(&mut self, id: &str) -> Result<&mut Store, RemoteError> {
    self
      .stores
      .values_mut()
      .find(|s| s.id == id)
      .ok_or_else(|| RemoteError::NotFound {
        kind: "key value store",
        name: id.to_string(),
      })
  }
}

/// Edge provider holding all state in memory.
#[derive(Debug)]
pub struct MemoryEdge {
  state: Mutex<State>,
  page_size: usize,
}

impl Default for MemoryEdge {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryEdge {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(State::default()),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }

  /// Limit every listing to `page_size` items per page.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Create an empty store and return its id. Creating an existing store
  /// returns the existing id.
  pub fn create_store(&self, name: &str) -> String {
    let mut state = self.lock();
    if let Some(store) = state.stores.get(name) {
      return store.id.clone();
    }
    let id = format!("arn:memory:key-value-store/{}", state.stores.len() + 1);
    let version = state.next_etag();
    state.stores.insert(
      name.to_string(),
      Store {
        id: id.clone(),
        items: BTreeMap::new(),
        history: vec![version],
      },
    );
    id
  }

  pub fn store_id(&self, name: &str) -> Option<String> {
    self.lock().stores.get(name).map(|s| s.id.clone())
  }

  /// Insert items directly, bumping the version without recording a call.
  pub fn seed_store(&self, name: &str, items: &[Entry]) {
    self.create_store(name);
    let mut state = self.lock();
    let version = state.next_etag();
    if let Some(store) = state.stores.get_mut(name) {
      for entry in items {
        store.items.insert(entry.key.clone(), entry.value.clone());
      }
      store.history.push(version);
    }
  }

  /// Bump a store's version as if another writer had modified it.
  pub fn touch_store(&self, name: &str) {
    let mut state = self.lock();
    let version = state.next_etag();
    if let Some(store) = state.stores.get_mut(name) {
      store.history.push(version);
    }
  }

  pub fn store_version(&self, name: &str) -> Option<VersionToken> {
    self.lock().stores.get(name).map(|s| s.version().clone())
  }

  /// Every version a store has had, oldest first.
  pub fn store_version_history(&self, name: &str) -> Vec<VersionToken> {
    self.lock().stores.get(name).map(|s| s.history.clone()).unwrap_or_default()
  }

  pub fn store_items(&self, name: &str) -> BTreeMap<String, String> {
    self.lock().stores.get(name).map(|s| s.items.clone()).unwrap_or_default()
  }

  /// Make the `n`th `update_keys` call (1-based, counted from now on) fail
  /// without applying anything.
  pub fn fail_update_keys_at(&self, n: usize) {
    let mut state = self.lock();
    let offset = state.update_keys_count;
    state.fail_update_keys_at = Some(offset + n);
  }

  pub fn fail_publish_function(&self, name: &str) {
    self.lock().fail_publish.insert(name.to_string());
  }

  pub fn fail_describe_function(&self, name: &str) {
    self.lock().fail_describe.insert(name.to_string());
  }

  pub fn function_code(&self, name: &str, stage: FunctionStage) -> Option<Vec<u8>> {
    let state = self.lock();
    let function = state.functions.get(name)?;
    match stage {
      FunctionStage::Development => Some(function.development.clone()),
      FunctionStage::Live => function.live.clone(),
    }
  }

  pub fn function_config(&self, name: &str) -> Option<FunctionConfig> {
    self.lock().functions.get(name).map(|f| f.config.clone())
  }

  /// Calls made so far, in order.
  pub fn calls(&self) -> Vec<Call> {
    self.lock().calls.clone()
  }
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
  let next = (end < items.len()).then(|| end.to_string());
  Ok(Page {
    items: slice.to_vec(),
    next,
  })
}

impl KvsClient for MemoryEdge {
  async fn list_stores(&self, marker: Option<&str>) -> Result<Page<StoreSummary>, RemoteError> {
    let mut state = self.lock();
    state.calls.push(Call::ListStores {
      marker: marker.map(str::to_string),
    });
    let summaries: Vec<_> = state
      .stores
      .iter()
      .map(|(name, s)| StoreSummary {
        name: name.clone(),
        id: s.id.clone(),
      })
      .collect();
    page_of(&summaries, marker, self.page_size)
  }

  async fn describe_store(&self, store_id: &str) -> Result<StoreDescription, RemoteError> {
    let mut state = self.lock();
    state.calls.push(Call::DescribeStore {
      store: store_id.to_string(),
    });
    let store = state.store_by_id(store_id)?;
    Ok(StoreDescription {
      id: store.id.clone(),
      version: store.version().clone(),
      item_count: store.items.len(),
    })
  }

  async fn list_keys(&self, store_id: &str, next: Option<&str>) -> Result<Page<Entry>, RemoteError> {
    let mut state = self.lock();
    state.calls.push(Call::ListKeys {
      store: store_id.to_string(),
      next: next.map(str::to_string),
    });
    let store = state.store_by_id(store_id)?;
    let items: Vec<_> = store.items.iter().map(|(k, v)| Entry::new(k.clone(), v.clone())).collect();
    page_of(&items, next, self.page_size)
  }

  async fn update_keys(
    &self,
    store_id: &str,
    if_match: &VersionToken,
    puts: &[Entry],
    deletes: &[String],
  ) -> Result<VersionToken, RemoteError> {
    let mut state = self.lock();
    state.calls.push(Call::UpdateKeys {
      store: store_id.to_string(),
      if_match: if_match.clone(),
      puts: puts.to_vec(),
      deletes: deletes.to_vec(),
    });
    state.update_keys_count += 1;
    if state.fail_update_keys_at == Some(state.update_keys_count) {
      return Err(RemoteError::Rejected {
        operation: "update keys",
        message: "injected failure".to_string(),
      });
    }

    let version = state.next_etag();
    let store = state.store_by_id(store_id)?;
    if store.version() != if_match {
      return Err(RemoteError::Conflict {
        resource: store_id.to_string(),
        expected: if_match.clone(),
      });
    }
    for entry in puts {
      store.items.insert(entry.key.clone(), entry.value.clone());
    }
    for key in deletes {
      store.items.remove(key);
    }
    store.history.push(version.clone());
    Ok(version)
  }
}

impl FunctionClient for MemoryEdge {
  async fn describe_function(&self, name: &str, stage: FunctionStage) -> Result<FunctionDescription, RemoteError> {
    let mut state = self.lock();
    state.calls.push(Call::DescribeFunction {
      name: name.to_string(),
      stage,
    });
    if state.fail_describe.contains(name) {
      return Err(RemoteError::Rejected {
        operation: "describe function",
        message: "injected failure".to_string(),
      });
    }

    let not_found = || RemoteError::NotFound {
      kind: "function",
      name: name.to_string(),
    };
    let function = state.functions.get(name).ok_or_else(not_found)?;
    if stage == FunctionStage::Live && function.live.is_none() {
      return Err(not_found());
    }
    Ok(FunctionDescription {
      name: name.to_string(),
      stage,
      version: function.version.clone(),
    })
  }

  async fn create_function(
    &self,
    name: &str,
    config: &FunctionConfig,
    code: &[u8],
  ) -> Result<VersionToken, RemoteError> {
    let mut state = self.lock();
    if state.functions.contains_key(name) {
      return Err(RemoteError::Rejected {
        operation: "create function",
        message: format!("function already exists: {}", name),
      });
    }
    let version = state.next_etag();
    state.functions.insert(
      name.to_string(),
      Function {
        config: config.clone(),
        development: code.to_vec(),
        live: None,
        version: version.clone(),
      },
    );
    state.calls.push(Call::CreateFunction {
      name: name.to_string(),
      returned: version.clone(),
    });
    Ok(version)
  }

  async fn update_function(
    &self,
    name: &str,
    if_match: &VersionToken,
    config: &FunctionConfig,
    code: &[u8],
  ) -> Result<VersionToken, RemoteError> {
    let mut state = self.lock();
    let version = state.next_etag();
    let function = state.functions.get_mut(name).ok_or_else(|| RemoteError::NotFound {
      kind: "function",
      name: name.to_string(),
    })?;
    if &function.version != if_match {
      return Err(RemoteError::Conflict {
        resource: name.to_string(),
        expected: if_match.clone(),
      });
    }
    function.config = config.clone();
    function.development = code.to_vec();
    function.version = version.clone();
    state.calls.push(Call::UpdateFunction {
      name: name.to_string(),
      if_match: if_match.clone(),
      returned: version.clone(),
    });
    Ok(version)
  }

  async fn publish_function(&self, name: &str, if_match: &VersionToken) -> Result<VersionToken, RemoteError> {
    let mut state = self.lock();
    state.calls.push(Call::PublishFunction {
      name: name.to_string(),
      if_match: if_match.clone(),
    });
    if state.fail_publish.contains(name) {
      return Err(RemoteError::Rejected {
        operation: "publish function",
        message: "injected failure".to_string(),
      });
    }

    let version = state.next_etag();
    let function = state.functions.get_mut(name).ok_or_else(|| RemoteError::NotFound {
      kind: "function",
      name: name.to_string(),
    })?;
    if &function.version != if_match {
      return Err(RemoteError::Conflict {
        resource: name.to_string(),
        expected: if_match.clone(),
      });
    }
    function.live = Some(function.development.clone());
    function.version = version.clone();
    Ok(version)
  }
}
