//! HTTP API for the workout log
//!
//! | Method | Path                | Success                 |
//! |--------|---------------------|-------------------------|
//! | GET    | /api/workouts       | 200, records newest first |
//! | POST   | /api/workouts       | 201, created record     |
//! | DELETE | /api/workouts/:id   | 204, empty body         |

pub mod error;
pub mod routes;
pub mod validation;
mod workouts;

pub use error::ApiError;
pub use validation::{validate_new_workout, CreateWorkoutInput, FieldError};

use axum::routing::{delete, get};
use axum::Router;
use std::sync::Arc;

use crate::store::WorkoutStore;

/// Router state: the store handle every handler works against
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn WorkoutStore>,
}

impl AppState {
  pub fn new(store: Arc<dyn WorkoutStore>) -> Self {
    Self { store }
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route(
      routes::WORKOUTS,
      get(workouts::list_workouts).post(workouts::create_workout),
    )
    .route(routes::WORKOUT, delete(workouts::delete_workout))
    .with_state(state)
}
