use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::{debug, info};

use super::error::ApiError;
use super::validation::validate_new_workout;
use super::AppState;
use crate::models::Workout;

/// GET /api/workouts
pub async fn list_workouts(State(state): State<AppState>) -> Result<Json<Vec<Workout>>, ApiError> {
  let workouts = state.store.list().await?;
  Ok(Json(workouts))
}

/// POST /api/workouts
pub async fn create_workout(
  State(state): State<AppState>,
  body: Bytes,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
  let value = parse_body(&body)?;
  let new_workout = validate_new_workout(value)?;

  let workout = state.store.create(new_workout).await?;
  info!(
    id = workout.id,
    workout_type = %workout.workout_type,
    duration_seconds = workout.duration_seconds,
    "Workout logged"
  );

  Ok((StatusCode::CREATED, Json(workout)))
}

/// DELETE /api/workouts/:id
///
/// Always 204 on success, whether or not the id existed.
pub async fn delete_workout(
  State(state): State<AppState>,
  Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  match parse_id(&raw_id) {
    Some(id) => {
      state.store.delete(id).await?;
      info!(id, "Workout deleted");
    }
    None => debug!(raw_id = %raw_id, "Id is not a whole number, nothing to delete"),
  }

  Ok(StatusCode::NO_CONTENT)
}

/// An empty body reads as `{}` so missing fields surface as field errors
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(Value::Object(Default::default()));
  }
  serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}

/// Numeric reading of a path id: "12", " 12 ", "12.0" and "1e1" all name a row
fn parse_id(raw: &str) -> Option<i64> {
  let trimmed = raw.trim();
  if let Ok(id) = trimmed.parse::<i64>() {
    return Some(id);
  }

  let float = trimmed.parse::<f64>().ok()?;
  if float.is_finite() && float.fract() == 0.0 && float.abs() < 9.0e15 {
    Some(float as i64)
  } else {
    None
  }
}
