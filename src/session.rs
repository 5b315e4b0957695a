//! In-progress workout timer
//!
//! A session starts when the user begins the presented routine and is turned
//! into a `NewWorkout` when they finish. Recorded durations are at least one
//! second so a finished session is never logged as a legacy zero.

use chrono::{DateTime, Utc};

use crate::models::{NewWorkout, WorkoutType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkoutSession {
  pub workout_type: WorkoutType,
  pub started_at: DateTime<Utc>,
}

impl WorkoutSession {
  pub fn start(workout_type: WorkoutType, now: DateTime<Utc>) -> Self {
    Self {
      workout_type,
      started_at: now,
    }
  }

  /// Whole seconds since start; clock skew backwards reads as 0
  pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
    let elapsed = (now - self.started_at).num_seconds().max(0);
    u32::try_from(elapsed).unwrap_or(u32::MAX)
  }

  pub fn finish(&self, now: DateTime<Utc>) -> NewWorkout {
    NewWorkout {
      workout_type: self.workout_type,
      duration_seconds: self.elapsed_seconds(now).max(1),
    }
  }
}

/// Running timer display, e.g. "05:03"
pub fn format_clock(seconds: u32) -> String {
  format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Logged duration display, e.g. "5m 03s"
pub fn format_duration(seconds: u32) -> String {
  format!("{}m {:02}s", seconds / 60, seconds % 60)
}
