use serde::Serialize;

use super::workout::WorkoutType;

/// Fixed exercise set behind a workout type
#[derive(Debug, Clone, Serialize)]
pub struct Routine {
  pub workout_type: WorkoutType,
  pub title: &'static str,
  pub focus: &'static str,
  pub exercises: &'static [&'static str],
}

pub static ROUTINES: [Routine; 3] = [
  Routine {
    workout_type: WorkoutType::A,
    title: "Day A",
    focus: "Push",
    exercises: &["Push-ups", "Overhead Press", "Band Lateral Raise", "Bicep curls"],
  },
  Routine {
    workout_type: WorkoutType::B,
    title: "Day B",
    focus: "Pull",
    exercises: &[
      "Pull-ups or Lat Pulldown",
      "Band Row (single-arm or two-arm)",
      "Face Pulls",
    ],
  },
  Routine {
    workout_type: WorkoutType::C,
    title: "Day C",
    focus: "Legs",
    exercises: &[
      "Squat",
      "Reverse Lunge",
      "Band Romanian Deadlift (keep clean, slightly easier)",
    ],
  },
];

impl Routine {
  pub fn for_type(workout_type: WorkoutType) -> &'static Routine {
    match workout_type {
      WorkoutType::A => &ROUTINES[0],
      WorkoutType::B => &ROUTINES[1],
      WorkoutType::C => &ROUTINES[2],
    }
  }
}
