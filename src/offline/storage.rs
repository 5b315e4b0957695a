use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;

use super::network::AssetResponse;
use super::OfflineError;

/// Named response caches, keyed by request URL (fragment ignored)
#[async_trait]
pub trait CacheStorage: Send + Sync {
  /// Create the named cache if it does not exist yet
  async fn open(&self, cache_name: &str) -> Result<(), OfflineError>;

  /// Cache names in creation order
  async fn keys(&self) -> Result<Vec<String>, OfflineError>;

  /// Returns whether a cache was removed
  async fn delete(&self, cache_name: &str) -> Result<bool, OfflineError>;

  async fn put(
    &self,
    cache_name: &str,
    url: &Url,
    response: AssetResponse,
  ) -> Result<(), OfflineError>;

  /// First match across all caches, oldest cache first
  async fn match_url(&self, url: &Url) -> Result<Option<AssetResponse>, OfflineError>;
}

pub(crate) fn cache_key(url: &Url) -> String {
  let mut url = url.clone();
  url.set_fragment(None);
  url.into()
}

#[derive(Debug)]
struct NamedCache {
  name: String,
  entries: HashMap<String, AssetResponse>,
}

#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
  caches: Mutex<Vec<NamedCache>>,
}

impl MemoryCacheStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn caches(&self) -> Result<MutexGuard<'_, Vec<NamedCache>>, OfflineError> {
    self
      .caches
      .lock()
      .map_err(|_| OfflineError::Storage("cache storage lock poisoned".into()))
  }

  fn open_in(caches: &mut Vec<NamedCache>, cache_name: &str) -> usize {
    if let Some(idx) = caches.iter().position(|c| c.name == cache_name) {
      return idx;
    }
    caches.push(NamedCache {
      name: cache_name.to_string(),
      entries: HashMap::new(),
    });
    caches.len() - 1
  }

  /// Number of entries in one cache, `None` if it does not exist
  pub fn entry_count(&self, cache_name: &str) -> Option<usize> {
    let caches = self.caches().ok()?;
    caches
      .iter()
      .find(|c| c.name == cache_name)
      .map(|c| c.entries.len())
  }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
  async fn open(&self, cache_name: &str) -> Result<(), OfflineError> {
    let mut caches = self.caches()?;
    Self::open_in(&mut caches, cache_name);
    Ok(())
  }

  async fn keys(&self) -> Result<Vec<String>, OfflineError> {
    Ok(self.caches()?.iter().map(|c| c.name.clone()).collect())
  }

  async fn delete(&self, cache_name: &str) -> Result<bool, OfflineError> {
    let mut caches = self.caches()?;
    let before = caches.len();
    caches.retain(|c| c.name != cache_name);
    Ok(caches.len() != before)
  }

  async fn put(
    &self,
    cache_name: &str,
    url: &Url,
    response: AssetResponse,
  ) -> Result<(), OfflineError> {
    let mut caches = self.caches()?;
    let idx = Self::open_in(&mut caches, cache_name);
    caches[idx].entries.insert(cache_key(url), response);
    Ok(())
  }

  async fn match_url(&self, url: &Url) -> Result<Option<AssetResponse>, OfflineError> {
    let key = cache_key(url);
    Ok(
      self
        .caches()?
        .iter()
        .find_map(|c| c.entries.get(&key).cloned()),
    )
  }
}
