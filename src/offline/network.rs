use async_trait::async_trait;
use reqwest::{header, Client, Method};
use url::Url;

/// How the page issued a request; only navigations get network-first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  /// Full page load
  Navigate,
  SameOrigin,
  NoCors,
  Cors,
}

#[derive(Debug, Clone)]
pub struct AssetRequest {
  pub method: Method,
  pub url: Url,
  pub mode: RequestMode,
}

impl AssetRequest {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      mode: RequestMode::NoCors,
    }
  }

  pub fn navigate(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      mode: RequestMode::Navigate,
    }
  }

  pub fn with_method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }
}

/// Fully buffered response, cheap to clone into the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl AssetResponse {
  pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status: 200,
      content_type: Some(content_type.to_string()),
      body: body.into(),
    }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Network unreachable: {0}")]
  Unreachable(String),
}

/// Where cache misses and navigations go
#[async_trait]
pub trait Network: Send + Sync {
  /// Any HTTP status is a response; only transport failures are errors
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError>;
}

/// `Network` over a real HTTP client
#[derive(Debug, Clone, Default)]
pub struct HttpNetwork {
  client: Client,
}

impl HttpNetwork {
  pub fn new(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Network for HttpNetwork {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
    let response = self
      .client
      .request(request.method.clone(), request.url.clone())
      .send()
      .await?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = response.bytes().await?.to_vec();

    Ok(AssetResponse {
      status,
      content_type,
      body,
    })
  }
}
