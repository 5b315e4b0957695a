//! Typed client for the workout API
//!
//! Reads go through the client's own [`QueryCache`]; successful mutations
//! invalidate the workout list so the next read hits the server. Each client
//! allows one mutation in flight at a time.

pub mod cache;

pub use cache::{CacheResult, CacheSource, QueryCache};

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use url::Url;

use crate::api::routes::{self, build_url};
use crate::api::FieldError;
use crate::models::{NewWorkout, Workout};
use crate::rotation::Schedule;
use crate::session::{format_duration, WorkoutSession};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
  #[error("Invalid URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Rejected: {message}")]
  Validation {
    message: String,
    field: Option<String>,
  },

  #[error("API error ({status}): {message}")]
  Api { status: u16, message: String },

  #[error("Another change is still being saved")]
  MutationPending,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
  message: String,
}

/// Map a non-success response onto a `ClientError`
async fn error_from_response(response: Response) -> ClientError {
  let status = response.status();
  let text = response.text().await.unwrap_or_default();

  if status == StatusCode::BAD_REQUEST {
    if let Ok(field_error) = serde_json::from_str::<FieldError>(&text) {
      return ClientError::Validation {
        message: field_error.message,
        field: field_error.field,
      };
    }
  }

  let message = serde_json::from_str::<ErrorMessage>(&text)
    .map(|m| m.message)
    .unwrap_or(text);
  ClientError::Api {
    status: status.as_u16(),
    message,
  }
}

/// ---------------------------------------------------------------------------
/// User-facing Notices
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub title: String,
  pub description: String,
}

pub fn completion_notice(workout: &Workout) -> Notice {
  Notice {
    title: "Workout Completed!".into(),
    description: format!(
      "Great job finishing {} in {}.",
      workout.workout_type.label(),
      format_duration(workout.duration_seconds)
    ),
  }
}

pub fn deletion_notice() -> Notice {
  Notice {
    title: "Workout removed".into(),
    description: "History has been updated.".into(),
  }
}

pub fn log_failure_notice() -> Notice {
  Notice {
    title: "Error".into(),
    description: "Failed to log workout. Please try again.".into(),
  }
}

pub fn delete_failure_notice() -> Notice {
  Notice {
    title: "Error".into(),
    description: "Failed to delete workout.".into(),
  }
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

/// Clears the in-flight flag when the mutation finishes, however it ends
struct PendingMutation<'a>(&'a AtomicBool);

impl Drop for PendingMutation<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

pub struct WorkoutClient {
  http: Client,
  base_url: Url,
  cache: QueryCache,
  mutating: AtomicBool,
}

impl WorkoutClient {
  /// Client for the server at `base_url`, e.g. "http://127.0.0.1:5000"
  /// A path prefix such as "http://host/app" is kept in front of every route.
  pub fn new(base_url: &str) -> Result<Self, ClientError> {
    Self::with_cache(base_url, QueryCache::new())
  }

  pub fn with_cache(base_url: &str, cache: QueryCache) -> Result<Self, ClientError> {
    let mut base_url = Url::parse(base_url)?;
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    Ok(Self {
      http: Client::new(),
      base_url,
      cache,
      mutating: AtomicBool::new(false),
    })
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  /// True while a create or delete is awaiting the server
  pub fn is_mutating(&self) -> bool {
    self.mutating.load(Ordering::Acquire)
  }

  fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
    // Relative join so the base path prefix survives
    Ok(self.base_url.join(path.trim_start_matches('/'))?)
  }

  fn begin_mutation(&self) -> Result<PendingMutation<'_>, ClientError> {
    if self.mutating.swap(true, Ordering::AcqRel) {
      return Err(ClientError::MutationPending);
    }
    Ok(PendingMutation(&self.mutating))
  }

  /// Workout history in server order, cached under the list route
  pub async fn workouts(&self) -> Result<Vec<Workout>, ClientError> {
    let result = self
      .cache
      .fetch_query(routes::WORKOUTS, || self.fetch_workouts())
      .await?;
    Ok(result.data)
  }

  async fn fetch_workouts(&self) -> Result<Vec<Workout>, ClientError> {
    let response = self.http.get(self.endpoint(routes::WORKOUTS)?).send().await?;

    if !response.status().is_success() {
      return Err(error_from_response(response).await);
    }
    Ok(response.json().await?)
  }

  /// History sorted newest first plus the routine to present next
  pub async fn schedule(&self) -> Result<Schedule, ClientError> {
    Ok(Schedule::from_history(self.workouts().await?))
  }

  pub async fn create_workout(&self, workout: &NewWorkout) -> Result<Workout, ClientError> {
    let _pending = self.begin_mutation()?;

    let response = self
      .http
      .post(self.endpoint(routes::WORKOUTS)?)
      .json(workout)
      .send()
      .await?;

    if response.status() != StatusCode::CREATED {
      return Err(error_from_response(response).await);
    }

    let created: Workout = response.json().await?;
    self.cache.invalidate(routes::WORKOUTS);
    debug!(id = created.id, "Logged workout");
    Ok(created)
  }

  /// Log a finished session with its measured duration
  pub async fn complete_session(
    &self,
    session: &WorkoutSession,
    now: DateTime<Utc>,
  ) -> Result<Workout, ClientError> {
    self.create_workout(&session.finish(now)).await
  }

  pub async fn delete_workout(&self, id: i64) -> Result<(), ClientError> {
    let _pending = self.begin_mutation()?;

    let path = build_url(routes::WORKOUT, &[("id", &id.to_string())]);
    let response = self.http.delete(self.endpoint(&path)?).send().await?;

    if !response.status().is_success() {
      return Err(error_from_response(response).await);
    }

    self.cache.invalidate(routes::WORKOUTS);
    debug!(id, "Deleted workout");
    Ok(())
  }
}
