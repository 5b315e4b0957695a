//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seeders with explicit timestamps
//! - An API server on an ephemeral port
//! - Store doubles

use crate::api::{self, AppState};
use crate::models::{NewWorkout, Workout, WorkoutType};
use crate::store::{StoreError, WorkoutStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Insert one workout row directly, bypassing the store
/// `duration_seconds = None` produces a legacy row
pub async fn seed_workout(
  pool: &SqlitePool,
  workout_type: &str,
  duration_seconds: Option<i64>,
  completed_at: DateTime<Utc>,
) -> i64 {
  sqlx::query(
    r#"
    INSERT INTO workouts (type, duration_seconds, completed_at)
    VALUES (?1, ?2, ?3)
    "#,
  )
  .bind(workout_type)
  .bind(duration_seconds)
  .bind(completed_at)
  .execute(pool)
  .await
  .expect("Failed to insert test workout")
  .last_insert_rowid()
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Create a workout record completed N days ago
pub fn mock_workout(id: i64, workout_type: WorkoutType, days_ago: i64) -> Workout {
  Workout {
    id,
    workout_type,
    duration_seconds: 1800,
    completed_at: datetime_days_ago(days_ago),
  }
}

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Store Doubles
/// ---------------------------------------------------------------------------

/// Store whose every operation fails, for exercising 500 paths
pub struct FailingStore;

#[async_trait]
impl WorkoutStore for FailingStore {
  async fn list(&self) -> Result<Vec<Workout>, StoreError> {
    Err(StoreError::Unavailable("secret connection detail".into()))
  }

  async fn create(&self, _workout: NewWorkout) -> Result<Workout, StoreError> {
    Err(StoreError::Unavailable("secret connection detail".into()))
  }

  async fn delete(&self, _id: i64) -> Result<(), StoreError> {
    Err(StoreError::Unavailable("secret connection detail".into()))
  }
}

/// ---------------------------------------------------------------------------
/// Server Helpers
/// ---------------------------------------------------------------------------

/// Serve the API router for `store` on 127.0.0.1:<ephemeral>
/// Returns the base URL, e.g. "http://127.0.0.1:40123"
pub async fn spawn_test_server(store: Arc<dyn WorkoutStore>) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
    .await
    .expect("Failed to bind test listener");
  let addr = listener.local_addr().expect("Listener has no address");

  let app = api::router(AppState::new(store));
  tokio::spawn(async move {
    axum::serve(listener, app).await.expect("Test server failed");
  });

  format!("http://{}", addr)
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'workouts'")
        .fetch_all(&pool)
        .await
        .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_workout_returns_row_id() {
    let pool = setup_test_db().await;

    let first = seed_workout(&pool, "A", Some(60), datetime_days_ago(1)).await;
    let second = seed_workout(&pool, "B", None, datetime_days_ago(0)).await;
    assert!(second > first);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
      .fetch_one(&pool)
      .await
      .expect("Failed to count workouts");
    assert_eq!(count, 2);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_datetime_helpers_produce_correct_dates() {
    let diff = Utc::now() - datetime_days_ago(7);
    // Allow for slight timing differences (6-8 days is acceptable)
    assert!(
      diff.num_days() >= 6 && diff.num_days() <= 8,
      "Expected ~7 days difference, got {}",
      diff.num_days()
    );
  }
}
