use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use super::validation::FieldError;
use crate::store::StoreError;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
struct ErrorBody {
  message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("Validation failed: {0}")]
  Validation(FieldError),

  #[error("Malformed JSON body: {0}")]
  MalformedBody(String),

  #[error("Store error: {0}")]
  Store(#[from] StoreError),
}

impl From<FieldError> for ApiError {
  fn from(err: FieldError) -> Self {
    Self::Validation(err)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      Self::Validation(field_error) => (StatusCode::BAD_REQUEST, Json(field_error)).into_response(),
      Self::MalformedBody(_) => (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
          message: "Malformed JSON body".into(),
        }),
      )
        .into_response(),
      Self::Store(err) => {
        // Detail stays in the log
        error!(error = %err, "Request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(ErrorBody {
            message: INTERNAL_MESSAGE.into(),
          }),
        )
          .into_response()
      }
    }
  }
}
