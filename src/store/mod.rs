//! Data access for completed workouts
//!
//! Route handlers only ever see `dyn WorkoutStore`, so the SQLite backend can
//! be swapped for the in-memory one (or a failing double) in tests.

mod memory;
mod sqlite;

pub use memory::MemoryWorkoutStore;
pub use sqlite::SqliteWorkoutStore;

use async_trait::async_trait;

use crate::models::{NewWorkout, Workout};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Store unavailable: {0}")]
  Unavailable(String),
}

/// ---------------------------------------------------------------------------
/// Store Trait
/// ---------------------------------------------------------------------------

#[async_trait]
pub trait WorkoutStore: Send + Sync {
  /// All records, newest `completed_at` first (ties: highest id first)
  async fn list(&self) -> Result<Vec<Workout>, StoreError>;

  /// Insert with a store-assigned id and `completed_at = now`
  async fn create(&self, workout: NewWorkout) -> Result<Workout, StoreError>;

  /// Remove by id. Deleting an absent id is not an error.
  async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Ordering shared by every backend: newest first, id breaks ties
pub(crate) fn newest_first(a: &Workout, b: &Workout) -> std::cmp::Ordering {
  b.completed_at
    .cmp(&a.completed_at)
    .then_with(|| b.id.cmp(&a.id))
}
