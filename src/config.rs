use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::offline;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const BIND_VAR: &str = "CIRCUIT_BIND";
const DATABASE_URL_VAR: &str = "DATABASE_URL";
const APP_VERSION_VAR: &str = "CIRCUIT_APP_VERSION";
const ENV_VAR: &str = "CIRCUIT_ENV";

const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {0}: {1}")]
  Invalid(&'static str, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
  Development,
  Production,
}

impl std::str::FromStr for Environment {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "development" | "dev" => Ok(Self::Development),
      "production" | "prod" => Ok(Self::Production),
      other => Err(format!("expected development or production, got {:?}", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub bind: SocketAddr,
  pub database_url: String,
  pub app_version: String,
  pub environment: Environment,
}

impl Config {
  /// Read configuration from the process environment
  /// Call `dotenvy::dotenv()` first to pick up a `.env` file
  pub fn from_env() -> Result<Self, ConfigError> {
    let bind_raw = env::var(BIND_VAR).unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let bind = bind_raw
      .parse::<SocketAddr>()
      .map_err(|e| ConfigError::Invalid(BIND_VAR, format!("{:?}: {}", bind_raw, e)))?;

    let database_url = env::var(DATABASE_URL_VAR)
      .ok()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(default_database_url);

    let app_version = env::var(APP_VERSION_VAR)
      .ok()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    let environment = match env::var(ENV_VAR) {
      Ok(raw) => raw
        .parse::<Environment>()
        .map_err(|e| ConfigError::Invalid(ENV_VAR, e))?,
      Err(_) => Environment::Development,
    };

    Ok(Self {
      bind,
      database_url,
      app_version,
      environment,
    })
  }

  pub fn is_production(&self) -> bool {
    self.environment == Environment::Production
  }

  /// Worker script the client should register, if any
  pub fn service_worker_url(&self) -> Option<String> {
    offline::registration_url("/", &self.app_version, self.is_production())
  }
}

/// Stored in: <data dir>/circuit/circuit.db (./data when there is no data dir)
fn default_database_path() -> PathBuf {
  dirs::data_dir()
    .map(|dir| dir.join("circuit"))
    .unwrap_or_else(|| PathBuf::from("data"))
    .join("circuit.db")
}

fn default_database_url() -> String {
  format!("sqlite://{}?mode=rwc", default_database_path().display())
}
