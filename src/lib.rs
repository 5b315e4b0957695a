pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod offline;
pub mod rotation;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use api::AppState;
use config::Config;
use store::SqliteWorkoutStore;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error(transparent)]
  Config(#[from] config::ConfigError),

  #[error(transparent)]
  Db(#[from] db::DbError),

  #[error("Server error: {0}")]
  Io(#[from] std::io::Error),
}

/// Open the database, then serve the workout API until Ctrl-C
pub async fn run(config: Config) -> Result<(), AppError> {
  let pool = db::initialize_db(&config.database_url).await?;
  let state = AppState::new(Arc::new(SqliteWorkoutStore::new(pool)));
  let app = api::router(state);

  let listener = tokio::net::TcpListener::bind(config.bind).await?;
  info!(
    "listening on http://{} ({:?}, version {})",
    listener.local_addr()?,
    config.environment,
    config.app_version
  );
  match config.service_worker_url() {
    Some(url) => info!(%url, "clients should register the offline worker"),
    None => info!("offline worker disabled outside production"),
  }

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!("failed to listen for shutdown signal: {}", e);
    std::future::pending::<()>().await;
  }
}
