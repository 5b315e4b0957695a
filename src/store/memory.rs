use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use super::{newest_first, StoreError, WorkoutStore};
use crate::models::{NewWorkout, Workout};

#[derive(Debug, Default)]
struct Inner {
  workouts: Vec<Workout>,
  next_id: i64,
}

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryWorkoutStore {
  inner: Mutex<Inner>,
}

impl MemoryWorkoutStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
    self
      .inner
      .lock()
      .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
  }
}

#[async_trait]
impl WorkoutStore for MemoryWorkoutStore {
  async fn list(&self) -> Result<Vec<Workout>, StoreError> {
    let mut workouts = self.lock()?.workouts.clone();
    workouts.sort_by(newest_first);
    Ok(workouts)
  }

  async fn create(&self, workout: NewWorkout) -> Result<Workout, StoreError> {
    let mut inner = self.lock()?;
    inner.next_id += 1;

    let created = Workout {
      id: inner.next_id,
      workout_type: workout.workout_type,
      duration_seconds: workout.duration_seconds,
      completed_at: Utc::now(),
    };
    inner.workouts.push(created.clone());
    Ok(created)
  }

  async fn delete(&self, id: i64) -> Result<(), StoreError> {
    self.lock()?.workouts.retain(|w| w.id != id);
    Ok(())
  }
}
