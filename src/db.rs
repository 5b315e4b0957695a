use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub type DbPool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
  #[error("Failed to create data directory {0}: {1}")]
  DataDir(PathBuf, std::io::Error),

  #[error("Failed to connect: {0}")]
  Connect(#[from] sqlx::Error),

  #[error("Failed to run migrations: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

/// File path behind a `sqlite://` URL, if it names one
fn sqlite_file_path(db_url: &str) -> Option<&Path> {
  let rest = db_url
    .strip_prefix("sqlite://")
    .or_else(|| db_url.strip_prefix("sqlite:"))?;
  let path = rest.split('?').next().unwrap_or(rest);

  if path.is_empty() || path.starts_with(":memory:") {
    return None;
  }
  Some(Path::new(path))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(db_url: &str) -> Result<DbPool, DbError> {
  if let Some(parent) = sqlite_file_path(db_url).and_then(Path::parent) {
    if !parent.as_os_str().is_empty() {
      // Create directory if it doesn't exist
      fs::create_dir_all(parent).map_err(|e| DbError::DataDir(parent.to_path_buf(), e))?;
    }
  }

  info!(url = db_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
