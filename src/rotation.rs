//! Push/Pull/Legs rotation
//!
//! The next routine is the cyclic successor of the most recently completed
//! one (A -> B -> C -> A), starting at A when there is no history.
//! History is always sorted here before the newest entry is read, so callers
//! never depend on the order the server returned.

use serde::Serialize;

use crate::models::{Workout, WorkoutType};
use crate::store::newest_first;

/// Next routine given the type of the latest completed session
pub fn next_workout_type(last: Option<WorkoutType>) -> WorkoutType {
    last.map(WorkoutType::next).unwrap_or(WorkoutType::A)
}

/// Sort by completion time, newest first (ties: highest id first)
pub fn sort_newest_first(workouts: &mut [Workout]) {
    workouts.sort_by(newest_first);
}

/// Next routine for an unsorted history
pub fn next_from_history(history: &[Workout]) -> WorkoutType {
    let latest = history.iter().min_by(|a, b| newest_first(a, b));
    next_workout_type(latest.map(|w| w.workout_type))
}

/// ---------------------------------------------------------------------------
/// Schedule: what the home view shows
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    /// Routine to present next
    pub next: WorkoutType,
    /// Newest first
    pub history: Vec<Workout>,
}

impl Schedule {
    pub fn from_history(mut history: Vec<Workout>) -> Self {
        sort_newest_first(&mut history);
        let next = next_workout_type(history.first().map(|w| w.workout_type));
        Self { next, history }
    }

    pub fn sessions_logged(&self) -> usize {
        self.history.len()
    }
}
