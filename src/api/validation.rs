//! Shape checks for the create payload
//!
//! Fields are checked in declaration order (`type`, then `durationSeconds`)
//! and the first violation wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{NewWorkout, WorkoutType};

/// First failing field of a rejected payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl FieldError {
  fn on(field: &str, message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      field: Some(field.to_string()),
    }
  }

  fn root(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      field: None,
    }
  }
}

impl std::fmt::Display for FieldError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.field {
      Some(field) => write!(f, "{}: {}", field, self.message),
      None => f.write_str(&self.message),
    }
  }
}

/// Create payload before validation; `null` and missing both land as `None`
#[derive(Debug, Default, Deserialize)]
pub struct CreateWorkoutInput {
  #[serde(rename = "type", default)]
  pub workout_type: Option<Value>,
  #[serde(rename = "durationSeconds", default)]
  pub duration_seconds: Option<Value>,
}

impl CreateWorkoutInput {
  /// Accepts any JSON value; non-objects are rejected without a field
  pub fn from_value(value: Value) -> Result<Self, FieldError> {
    if !value.is_object() {
      return Err(FieldError::root(format!(
        "Expected object, received {}",
        kind_of(&value)
      )));
    }
    serde_json::from_value(value).map_err(|e| FieldError::root(e.to_string()))
  }

  pub fn validate(&self) -> Result<NewWorkout, FieldError> {
    let workout_type = validate_type(self.workout_type.as_ref())?;
    let duration_seconds = validate_duration(self.duration_seconds.as_ref())?;

    Ok(NewWorkout {
      workout_type,
      duration_seconds,
    })
  }
}

/// Parse and validate a create payload in one step
pub fn validate_new_workout(value: Value) -> Result<NewWorkout, FieldError> {
  CreateWorkoutInput::from_value(value)?.validate()
}

fn validate_type(value: Option<&Value>) -> Result<WorkoutType, FieldError> {
  const FIELD: &str = "type";

  match value {
    None => Err(FieldError::on(FIELD, "Required")),
    Some(Value::String(s)) => s.parse::<WorkoutType>().map_err(|_| {
      FieldError::on(
        FIELD,
        format!(
          "Invalid enum value. Expected 'A' | 'B' | 'C', received '{}'",
          s
        ),
      )
    }),
    Some(other) => Err(FieldError::on(
      FIELD,
      format!("Expected 'A' | 'B' | 'C', received {}", kind_of(other)),
    )),
  }
}

fn validate_duration(value: Option<&Value>) -> Result<u32, FieldError> {
  const FIELD: &str = "durationSeconds";
  let too_large = || {
    FieldError::on(
      FIELD,
      format!("Number must be less than or equal to {}", u32::MAX),
    )
  };
  let negative = || FieldError::on(FIELD, "Number must be greater than or equal to 0");

  let number = match value {
    None => return Err(FieldError::on(FIELD, "Required")),
    Some(Value::Number(n)) => n,
    Some(other) => {
      return Err(FieldError::on(
        FIELD,
        format!("Expected number, received {}", kind_of(other)),
      ))
    }
  };

  if let Some(unsigned) = number.as_u64() {
    return u32::try_from(unsigned).map_err(|_| too_large());
  }
  if number.as_i64().is_some() {
    return Err(negative());
  }

  // Float literal, e.g. 90.0 or 1.5
  let float = number.as_f64().unwrap_or(f64::NAN);
  if !float.is_finite() || float.fract() != 0.0 {
    return Err(FieldError::on(FIELD, "Expected integer, received float"));
  }
  if float < 0.0 {
    return Err(negative());
  }
  if float > f64::from(u32::MAX) {
    return Err(too_large());
  }
  Ok(float as u32)
}

fn kind_of(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
