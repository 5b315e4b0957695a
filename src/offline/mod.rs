//! Offline shell cache
//!
//! Models the service worker that keeps the app usable without a network:
//!
//! - install: pre-cache the application shell under a versioned cache name
//! - activate: evict caches left behind by older versions, claim clients
//! - fetch: network-first for navigations (falling back to the cached shell
//!   document), cache-first for everything else
//!
//! Only same-origin GET requests are intercepted. Cache writes finish before
//! the response is handed back.

mod network;
mod storage;

pub use network::{AssetRequest, AssetResponse, HttpNetwork, Network, NetworkError, RequestMode};
pub use storage::{CacheStorage, MemoryCacheStorage};

use reqwest::Method;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const CACHE_PREFIX: &str = "workout-tracker-";
pub const DEFAULT_VERSION: &str = "dev";
pub const WORKER_SCRIPT: &str = "sw.js";
pub const SHELL_DOCUMENT: &str = "./index.html";
pub const SHELL_ASSETS: [&str; 4] = [
  "./",
  SHELL_DOCUMENT,
  "./manifest.webmanifest",
  "./favicon.png",
];

/// Worker script URL to register, e.g. "/sw.js?v=0.1.0"
///
/// Development builds do not register a worker at all.
pub fn registration_url(base_path: &str, app_version: &str, production: bool) -> Option<String> {
  if !production {
    return None;
  }
  let version: String = url::form_urlencoded::byte_serialize(app_version.as_bytes()).collect();
  Some(format!("{}{}?v={}", base_path, WORKER_SCRIPT, version))
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum OfflineError {
  #[error("Invalid URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("Failed to pre-cache {url}: {reason}")]
  Install { url: String, reason: String },

  #[error("Worker is {actual:?}, expected {expected:?}")]
  InvalidState {
    expected: WorkerState,
    actual: WorkerState,
  },

  #[error(transparent)]
  Network(#[from] NetworkError),

  #[error("Cache storage error: {0}")]
  Storage(String),

  #[error("Offline and no cached copy of {0}")]
  NotCached(String),
}

/// ---------------------------------------------------------------------------
/// Worker Lifecycle
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  Parsed,
  Installing,
  Installed,
  Activating,
  Activated,
  /// Install failed; this worker never takes over
  Redundant,
}

/// Outcome of intercepting a request
#[derive(Debug)]
pub enum FetchDecision {
  /// Not handled; the request goes to the network untouched
  PassThrough,
  Respond(Result<AssetResponse, OfflineError>),
}

pub struct ServiceWorker {
  script_url: Url,
  version: String,
  cache_name: String,
  state: WorkerState,
  skip_waiting: bool,
  controls_clients: bool,
  caches: Arc<dyn CacheStorage>,
  network: Arc<dyn Network>,
}

impl ServiceWorker {
  /// Worker loaded from `script_url`; its `v` query parameter is the version
  pub fn new(
    script_url: &str,
    caches: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
  ) -> Result<Self, OfflineError> {
    let script_url = Url::parse(script_url)?;
    let version = script_url
      .query_pairs()
      .find(|(k, _)| k == "v")
      .map(|(_, v)| v.into_owned())
      .filter(|v| !v.is_empty())
      .unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let cache_name = format!("{}{}", CACHE_PREFIX, version);

    Ok(Self {
      script_url,
      version,
      cache_name,
      state: WorkerState::Parsed,
      skip_waiting: false,
      controls_clients: false,
      caches,
      network,
    })
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn cache_name(&self) -> &str {
    &self.cache_name
  }

  pub fn state(&self) -> WorkerState {
    self.state
  }

  /// Install asked to activate without waiting for old pages to close
  pub fn skip_waiting(&self) -> bool {
    self.skip_waiting
  }

  pub fn controls_clients(&self) -> bool {
    self.controls_clients
  }

  /// Shell asset URLs resolved against the worker script location
  pub fn shell_urls(&self) -> Result<Vec<Url>, OfflineError> {
    SHELL_ASSETS
      .iter()
      .map(|path| self.script_url.join(path).map_err(OfflineError::from))
      .collect()
  }

  fn shell_document(&self) -> Result<Url, OfflineError> {
    Ok(self.script_url.join(SHELL_DOCUMENT)?)
  }

  fn expect_state(&self, expected: WorkerState) -> Result<(), OfflineError> {
    if self.state != expected {
      return Err(OfflineError::InvalidState {
        expected,
        actual: self.state,
      });
    }
    Ok(())
  }

  /// Pre-cache the shell. All-or-nothing: one failed asset fails the install
  /// and nothing is stored.
  pub async fn install(&mut self) -> Result<(), OfflineError> {
    self.expect_state(WorkerState::Parsed)?;
    self.state = WorkerState::Installing;

    match self.fetch_shell().await {
      Ok(responses) => {
        self.caches.open(&self.cache_name).await?;
        for (url, response) in responses {
          self.caches.put(&self.cache_name, &url, response).await?;
        }
        self.skip_waiting = true;
        self.state = WorkerState::Installed;
        info!(cache = %self.cache_name, "Offline shell cached");
        Ok(())
      }
      Err(e) => {
        self.state = WorkerState::Redundant;
        warn!(error = %e, "Offline shell install failed");
        Err(e)
      }
    }
  }

  async fn fetch_shell(&self) -> Result<Vec<(Url, AssetResponse)>, OfflineError> {
    let mut responses = Vec::new();
    for url in self.shell_urls()? {
      let response = self
        .network
        .fetch(&AssetRequest::get(url.clone()))
        .await
        .map_err(|e| OfflineError::Install {
          url: url.to_string(),
          reason: e.to_string(),
        })?;

      if !response.is_success() {
        return Err(OfflineError::Install {
          url: url.to_string(),
          reason: format!("status {}", response.status),
        });
      }
      responses.push((url, response));
    }
    Ok(responses)
  }

  /// Delete every cache from an older version and take control of open
  /// pages. Returns the names of the deleted caches.
  pub async fn activate(&mut self) -> Result<Vec<String>, OfflineError> {
    self.expect_state(WorkerState::Installed)?;
    self.state = WorkerState::Activating;

    let stale: Vec<String> = self
      .caches
      .keys()
      .await?
      .into_iter()
      .filter(|key| key.starts_with(CACHE_PREFIX) && *key != self.cache_name)
      .collect();

    for key in &stale {
      self.caches.delete(key).await?;
      info!(cache = %key, "Evicted stale offline cache");
    }

    self.controls_clients = true;
    self.state = WorkerState::Activated;
    Ok(stale)
  }

  /// Intercept a page request
  pub async fn handle_fetch(&self, request: &AssetRequest) -> FetchDecision {
    if self.state != WorkerState::Activated
      || request.method != Method::GET
      || request.url.origin() != self.script_url.origin()
    {
      return FetchDecision::PassThrough;
    }

    let result = if request.mode == RequestMode::Navigate {
      self.network_first(request).await
    } else {
      self.cache_first(request).await
    };
    FetchDecision::Respond(result)
  }

  async fn network_first(&self, request: &AssetRequest) -> Result<AssetResponse, OfflineError> {
    let shell = self.shell_document()?;

    match self.network.fetch(request).await {
      Ok(response) => {
        if let Err(e) = self
          .caches
          .put(&self.cache_name, &shell, response.clone())
          .await
        {
          warn!(error = %e, "Failed to refresh cached shell document");
        }
        Ok(response)
      }
      Err(_) => self
        .caches
        .match_url(&shell)
        .await?
        .ok_or_else(|| OfflineError::NotCached(shell.to_string())),
    }
  }

  async fn cache_first(&self, request: &AssetRequest) -> Result<AssetResponse, OfflineError> {
    if let Some(cached) = self.caches.match_url(&request.url).await? {
      return Ok(cached);
    }

    let response = self.network.fetch(request).await?;
    if let Err(e) = self
      .caches
      .put(&self.cache_name, &request.url, response.clone())
      .await
    {
      warn!(url = %request.url, error = %e, "Failed to cache response");
    }
    Ok(response)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Mutex;

  const ORIGIN: &str = "https://circuit.test";

  /// Network double serving fixed bodies by path, switchable offline
  #[derive(Default)]
  struct ScriptedNetwork {
    routes: Mutex<HashMap<String, AssetResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
  }

  impl ScriptedNetwork {
    fn with_shell() -> Self {
      let network = Self::default();
      network.serve("/", AssetResponse::ok("text/html", "<html>root</html>"));
      network.serve("/index.html", AssetResponse::ok("text/html", "<html>v1</html>"));
      network.serve(
        "/manifest.webmanifest",
        AssetResponse::ok("application/manifest+json", "{}"),
      );
      network.serve("/favicon.png", AssetResponse::ok("image/png", vec![0x89u8, 0x50]));
      network
    }

    fn serve(&self, path: &str, response: AssetResponse) {
      self.routes.lock().unwrap().insert(path.to_string(), response);
    }

    fn go_offline(&self) {
      self.offline.store(true, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.offline.load(Ordering::SeqCst) {
        return Err(NetworkError::Unreachable(request.url.to_string()));
      }
      Ok(
        self
          .routes
          .lock()
          .unwrap()
          .get(request.url.path())
          .cloned()
          .unwrap_or(AssetResponse {
            status: 404,
            content_type: None,
            body: Vec::new(),
          }),
      )
    }
  }

  fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
  }

  fn worker(
    version: &str,
    caches: &Arc<MemoryCacheStorage>,
    network: &Arc<ScriptedNetwork>,
  ) -> ServiceWorker {
    ServiceWorker::new(
      &format!("{}/sw.js?v={}", ORIGIN, version),
      caches.clone(),
      network.clone(),
    )
    .unwrap()
  }

  async fn active_worker(
    caches: &Arc<MemoryCacheStorage>,
    network: &Arc<ScriptedNetwork>,
  ) -> ServiceWorker {
    let mut sw = worker("v2", caches, network);
    sw.install().await.expect("Install");
    sw.activate().await.expect("Activate");
    sw
  }

  fn respond(decision: FetchDecision) -> Result<AssetResponse, OfflineError> {
    match decision {
      FetchDecision::Respond(result) => result,
      FetchDecision::PassThrough => panic!("Expected the worker to respond"),
    }
  }

  #[test]
  fn test_version_comes_from_script_url() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::default());

    let sw = worker("1.4.0", &caches, &network);
    assert_eq!(sw.version(), "1.4.0");
    assert_eq!(sw.cache_name(), "workout-tracker-1.4.0");
    assert_eq!(sw.state(), WorkerState::Parsed);

    let unversioned =
      ServiceWorker::new(&format!("{}/sw.js", ORIGIN), caches, network).unwrap();
    assert_eq!(unversioned.cache_name(), "workout-tracker-dev");
  }

  #[test]
  fn test_shell_urls_resolve_against_script_location() {
    let sw = ServiceWorker::new(
      "https://circuit.test/app/sw.js?v=1",
      Arc::new(MemoryCacheStorage::new()),
      Arc::new(ScriptedNetwork::default()),
    )
    .unwrap();

    let urls: Vec<String> = sw.shell_urls().unwrap().iter().map(|u| u.to_string()).collect();
    assert_eq!(
      urls,
      vec![
        "https://circuit.test/app/",
        "https://circuit.test/app/index.html",
        "https://circuit.test/app/manifest.webmanifest",
        "https://circuit.test/app/favicon.png",
      ]
    );
  }

  #[test]
  fn test_registration_only_in_production() {
    assert_eq!(
      registration_url("/", "0.3.1", true).as_deref(),
      Some("/sw.js?v=0.3.1")
    );
    assert_eq!(registration_url("/", "0.3.1", false), None);
    assert_eq!(
      registration_url("/app/", "1.0 beta", true).as_deref(),
      Some("/app/sw.js?v=1.0+beta")
    );
  }

  #[tokio::test]
  async fn test_install_precaches_shell() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let mut sw = worker("v2", &caches, &network);

    sw.install().await.expect("Install should succeed");

    assert_eq!(sw.state(), WorkerState::Installed);
    assert!(sw.skip_waiting());
    assert_eq!(caches.entry_count("workout-tracker-v2"), Some(SHELL_ASSETS.len()));
    let doc = caches.match_url(&url("/index.html")).await.unwrap().unwrap();
    assert_eq!(doc.body, b"<html>v1</html>".to_vec());
  }

  #[tokio::test]
  async fn test_install_is_all_or_nothing() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    network.serve(
      "/favicon.png",
      AssetResponse {
        status: 404,
        content_type: None,
        body: Vec::new(),
      },
    );
    let mut sw = worker("v2", &caches, &network);

    let err = sw.install().await.unwrap_err();
    assert!(matches!(err, OfflineError::Install { ref url, .. } if url.ends_with("/favicon.png")));
    assert_eq!(sw.state(), WorkerState::Redundant);
    assert!(caches.match_url(&url("/index.html")).await.unwrap().is_none());
    assert!(matches!(
      sw.activate().await,
      Err(OfflineError::InvalidState { .. })
    ));
  }

  #[tokio::test]
  async fn test_activation_evicts_only_older_versions() {
    let caches = Arc::new(MemoryCacheStorage::new());
    caches.open("workout-tracker-v1").await.unwrap();
    caches.open("workout-tracker-v2").await.unwrap();
    caches.open("unrelated-cache").await.unwrap();
    let network = Arc::new(ScriptedNetwork::with_shell());

    let mut sw = worker("v2", &caches, &network);
    sw.install().await.unwrap();
    let deleted = sw.activate().await.unwrap();

    assert_eq!(deleted, vec!["workout-tracker-v1".to_string()]);
    assert_eq!(
      caches.keys().await.unwrap(),
      vec!["workout-tracker-v2".to_string(), "unrelated-cache".to_string()]
    );
    assert_eq!(sw.state(), WorkerState::Activated);
    assert!(sw.controls_clients());
  }

  #[tokio::test]
  async fn test_activate_requires_install() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let mut sw = worker("v2", &caches, &network);

    let err = sw.activate().await.unwrap_err();
    assert!(matches!(
      err,
      OfflineError::InvalidState {
        expected: WorkerState::Installed,
        actual: WorkerState::Parsed
      }
    ));
  }

  #[tokio::test]
  async fn test_cached_asset_served_while_offline() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let sw = active_worker(&caches, &network).await;

    network.go_offline();
    let response = respond(sw.handle_fetch(&AssetRequest::get(url("/favicon.png"))).await)
      .expect("Cached asset should be served");

    assert_eq!(response.body, vec![0x89, 0x50]);
  }

  #[tokio::test]
  async fn test_cache_first_fills_cache_on_miss() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    network.serve("/assets/app.js", AssetResponse::ok("text/javascript", "boot()"));
    let sw = active_worker(&caches, &network).await;
    let calls_after_install = network.calls();

    let request = AssetRequest::get(url("/assets/app.js"));
    let first = respond(sw.handle_fetch(&request).await).unwrap();
    let second = respond(sw.handle_fetch(&request).await).unwrap();

    assert_eq!(first, second);
    assert_eq!(network.calls(), calls_after_install + 1);
  }

  #[tokio::test]
  async fn test_cache_miss_offline_is_an_error() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let sw = active_worker(&caches, &network).await;

    network.go_offline();
    let result = respond(sw.handle_fetch(&AssetRequest::get(url("/assets/never.js"))).await);
    assert!(matches!(result, Err(OfflineError::Network(_))));
  }

  #[tokio::test]
  async fn test_navigation_is_network_first_with_shell_fallback() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let sw = active_worker(&caches, &network).await;

    // Online: the live page wins and replaces the cached shell document
    network.serve("/history", AssetResponse::ok("text/html", "<html>v2</html>"));
    let live = respond(sw.handle_fetch(&AssetRequest::navigate(url("/history"))).await).unwrap();
    assert_eq!(live.body, b"<html>v2</html>".to_vec());

    network.go_offline();
    let fallback =
      respond(sw.handle_fetch(&AssetRequest::navigate(url("/anything"))).await).unwrap();
    assert_eq!(fallback.body, b"<html>v2</html>".to_vec());
  }

  #[tokio::test]
  async fn test_navigation_offline_without_shell_fails() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let sw = active_worker(&caches, &network).await;

    caches.delete(sw.cache_name()).await.unwrap();
    network.go_offline();

    let result = respond(sw.handle_fetch(&AssetRequest::navigate(url("/"))).await);
    assert!(matches!(result, Err(OfflineError::NotCached(_))));
  }

  #[tokio::test]
  async fn test_non_get_and_cross_origin_pass_through() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let sw = active_worker(&caches, &network).await;

    let post = AssetRequest::get(url("/api/workouts")).with_method(Method::POST);
    assert!(matches!(sw.handle_fetch(&post).await, FetchDecision::PassThrough));

    let foreign = AssetRequest::get(Url::parse("https://cdn.example.com/font.woff2").unwrap());
    assert!(matches!(sw.handle_fetch(&foreign).await, FetchDecision::PassThrough));
  }

  #[tokio::test]
  async fn test_inactive_worker_does_not_intercept() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::with_shell());
    let mut sw = worker("v2", &caches, &network);
    sw.install().await.unwrap();

    let decision = sw.handle_fetch(&AssetRequest::get(url("/favicon.png"))).await;
    assert!(matches!(decision, FetchDecision::PassThrough));
  }
}
