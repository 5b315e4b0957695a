//! Query cache keyed by route.
//!
//! One `QueryCache` belongs to one client context; nothing here is global.
//! Entries stay fresh until invalidated unless a stale time is configured.

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  Cache,
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CachedQuery {
  value: Value,
  cached_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct QueryCache {
  entries: Mutex<HashMap<String, CachedQuery>>,
  /// `None` keeps entries until invalidated
  stale_time: Option<Duration>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = Some(stale_time);
    self
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedQuery>> {
    // A panic mid-insert cannot leave a half-written entry behind
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    self
      .stale_time
      .is_some_and(|stale_time| Utc::now() - cached_at > stale_time)
  }

  /// Return the cached value for `key` when fresh, otherwise run `fetcher`
  /// and cache its result. Fetch errors are returned as-is and leave the
  /// cache untouched.
  pub async fn fetch_query<T, E, F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let cached = self.entries().get(key).cloned();
    if let Some(cached) = cached.filter(|c| !self.is_stale(c.cached_at)) {
      match serde_json::from_value::<T>(cached.value) {
        Ok(data) => {
          return Ok(CacheResult {
            data,
            source: CacheSource::Cache,
            cached_at: Some(cached.cached_at),
          })
        }
        Err(e) => warn!(key, error = %e, "Discarding undecodable cache entry"),
      }
    }

    let data = fetcher().await?;
    match serde_json::to_value(&data) {
      Ok(value) => {
        self.entries().insert(
          key.to_string(),
          CachedQuery {
            value,
            cached_at: Utc::now(),
          },
        );
      }
      Err(e) => warn!(key, error = %e, "Response not cacheable"),
    }

    Ok(CacheResult {
      data,
      source: CacheSource::Network,
      cached_at: None,
    })
  }

  pub fn invalidate(&self, key: &str) {
    self.entries().remove(key);
  }

  pub fn is_cached(&self, key: &str) -> bool {
    self.entries().contains_key(key)
  }
}
