use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::JamsError;

/// One timed data point within an annotation.
///
/// `value` and `confidence` are untyped here; their shape is fixed by the
/// owning annotation's namespace and checked by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    pub time: f64,
    pub duration: f64,
    pub value: Value,
    #[serde(default)]
    pub confidence: Value,
}

impl Observation {
    pub fn new(
        time: f64,
        duration: f64,
        value: impl Into<Value>,
        confidence: impl Into<Value>,
    ) -> Result<Self, JamsError> {
        check_time("time", time)?;
        check_time("duration", duration)?;
        Ok(Self {
            time,
            duration,
            value: value.into(),
            confidence: confidence.into(),
        })
    }

    /// Instantaneous observation (zero duration) without a confidence.
    pub fn event(time: f64, value: impl Into<Value>) -> Result<Self, JamsError> {
        Self::new(time, 0.0, value, Value::Null)
    }

    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }

    /// Whether the observation overlaps the half-open window `[start, end)`.
    ///
    /// Zero-duration observations overlap when `start <= time < end`.
    pub fn intersects(&self, start: f64, end: f64) -> bool {
        if self.duration == 0.0 {
            start <= self.time && self.time < end
        } else {
            self.time < end && self.end_time() > start
        }
    }
}

pub(crate) fn check_time(field: &str, value: f64) -> Result<(), JamsError> {
    if !value.is_finite() {
        return Err(JamsError::parameter(format!("{field} must be finite, got {value}")));
    }
    if value < 0.0 {
        return Err(JamsError::parameter(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    Ok(())
}
