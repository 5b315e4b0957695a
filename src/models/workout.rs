use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::routine::Routine;

/// One of the three rotating routines: A = Push, B = Pull, C = Legs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkoutType {
  A,
  B,
  C,
}

impl WorkoutType {
  pub const ALL: [WorkoutType; 3] = [WorkoutType::A, WorkoutType::B, WorkoutType::C];

  /// Successor in the fixed cycle A -> B -> C -> A
  pub fn next(self) -> Self {
    match self {
      Self::A => Self::B,
      Self::B => Self::C,
      Self::C => Self::A,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::A => "A",
      Self::B => "B",
      Self::C => "C",
    }
  }

  pub fn routine(self) -> &'static Routine {
    Routine::for_type(self)
  }

  /// Human label, e.g. "Day A (Push)"
  pub fn label(self) -> String {
    let routine = self.routine();
    format!("{} ({})", routine.title, routine.focus)
  }
}

impl std::fmt::Display for WorkoutType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for WorkoutType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "A" => Ok(Self::A),
      "B" => Ok(Self::B),
      "C" => Ok(Self::C),
      _ => Err(format!("Unknown workout type: {}", s)),
    }
  }
}

/// A completed session as stored and served over the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
  pub id: i64,
  #[serde(rename = "type")]
  pub workout_type: WorkoutType,
  /// Sessions logged before durations were tracked read as 0
  #[serde(default)]
  pub duration_seconds: u32,
  pub completed_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for Workout {
  fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
    let raw_type: String = row.try_get("type")?;
    let workout_type = raw_type
      .parse::<WorkoutType>()
      .map_err(|e| sqlx::Error::ColumnDecode {
        index: "type".into(),
        source: e.into(),
      })?;

    // NULL marks a legacy row; the fallback is applied on read only
    let duration_seconds = match row.try_get::<Option<i64>, _>("duration_seconds")? {
      None => 0,
      Some(value) => u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: "duration_seconds".into(),
        source: Box::new(e),
      })?,
    };

    Ok(Self {
      id: row.try_get("id")?,
      workout_type,
      duration_seconds,
      completed_at: row.try_get("completed_at")?,
    })
  }
}

/// For inserting new workouts (without id, completed_at)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
  #[serde(rename = "type")]
  pub workout_type: WorkoutType,
  pub duration_seconds: u32,
}
