pub mod routine;
pub mod workout;

pub use routine::{Routine, ROUTINES};
pub use workout::{NewWorkout, Workout, WorkoutType};
