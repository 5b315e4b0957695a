use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{StoreError, WorkoutStore};
use crate::db::DbPool;
use crate::models::{NewWorkout, Workout};

/// `WorkoutStore` backed by the `workouts` table
#[derive(Clone)]
pub struct SqliteWorkoutStore {
  pool: DbPool,
}

impl SqliteWorkoutStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl WorkoutStore for SqliteWorkoutStore {
  async fn list(&self) -> Result<Vec<Workout>, StoreError> {
    let workouts = sqlx::query_as::<_, Workout>(
      "SELECT id, type, duration_seconds, completed_at FROM workouts
       ORDER BY completed_at DESC, id DESC",
    )
    .fetch_all(&self.pool)
    .await?;

    Ok(workouts)
  }

  async fn create(&self, workout: NewWorkout) -> Result<Workout, StoreError> {
    let created = sqlx::query_as::<_, Workout>(
      r#"
      INSERT INTO workouts (type, duration_seconds, completed_at)
      VALUES (?1, ?2, ?3)
      RETURNING id, type, duration_seconds, completed_at
      "#,
    )
    .bind(workout.workout_type.as_str())
    .bind(i64::from(workout.duration_seconds))
    .bind(Utc::now())
    .fetch_one(&self.pool)
    .await?;

    debug!(id = created.id, workout_type = %created.workout_type, "Inserted workout");
    Ok(created)
  }

  async fn delete(&self, id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM workouts WHERE id = ?1")
      .bind(id)
      .execute(&self.pool)
      .await?;

    debug!(id, rows = result.rows_affected(), "Deleted workout");
    Ok(())
  }
}
