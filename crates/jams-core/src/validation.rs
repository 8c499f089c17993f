//! # Validation
//!
//! Checks observations, annotations and whole documents against the
//! namespace contracts held in a [`NamespaceRegistry`].
//!
//! Structural checks are driven entirely by each namespace's [`ValueShape`];
//! there is no per-namespace code here.
//!
//! ## Modes
//!
//! - [`ValidationMode::FailFast`] stops at the first violation.
//! - [`ValidationMode::Accumulate`] collects every violation before failing.
//!
//! Either way a failure surfaces as [`JamsError::SchemaValidation`]. Time-range
//! containment problems are never failures; they are returned as
//! [`ValidationWarning`]s in the [`ValidationReport`].
//!
//! ```rust,ignore
//! use jams_core::{NamespaceRegistry, Validator, ValidationMode};
//!
//! let validator = Validator::new(NamespaceRegistry::global())
//!     .with_mode(ValidationMode::Accumulate);
//! let report = validator.validate_document(&jam)?;
//! for warning in &report.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::join_path;
use crate::model::{Annotation, Jams, Observation};
use crate::namespace::{NamespaceRegistry, NamespaceSchema, ValueShape};
use crate::{JamsError, SchemaValidationError, Violations};

/// Whether validation stops at the first violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    #[default]
    FailFast,
    Accumulate,
}

impl FromStr for ValidationMode {
    type Err = JamsError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(Self::FailFast),
            "accumulate" | "all" => Ok(Self::Accumulate),
            other => Err(JamsError::parameter(format!(
                "invalid validation mode '{other}', expected fail-fast or accumulate"
            ))),
        }
    }
}

/// Non-fatal finding from document validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl Display for ValidationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of a successful document validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let warning = ValidationWarning {
            path: path.into(),
            message: message.into(),
        };
        warn!(path = %warning.path, "{}", warning.message);
        self.warnings.push(warning);
    }
}

/// Validates model values against the namespaces of one registry.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r NamespaceRegistry,
    mode: ValidationMode,
}

impl Validator<'static> {
    /// Fail-fast validator over the global registry.
    pub fn global() -> Self {
        Self::new(NamespaceRegistry::global())
    }

    /// Like [`global`](Self::global), but fails if the built-in namespaces
    /// could not be loaded.
    pub fn try_global() -> Result<Self, JamsError> {
        Ok(Self::new(NamespaceRegistry::try_global()?))
    }
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r NamespaceRegistry) -> Self {
        Self {
            registry,
            mode: ValidationMode::FailFast,
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn registry(&self) -> &'r NamespaceRegistry {
        self.registry
    }

    /// Check one observation's time, duration, value and confidence.
    pub fn validate_observation(
        &self,
        observation: &Observation,
        schema: &NamespaceSchema,
    ) -> Result<(), JamsError> {
        validate_observation(observation, schema, self.mode)
    }

    /// Look up the annotation's namespace and check every observation.
    pub fn validate_annotation(&self, annotation: &Annotation) -> Result<(), JamsError> {
        let schema = self.registry.lookup(annotation.namespace())?;
        let mut sink = Collector::new(self.mode);
        check_annotation(annotation, &schema, "", &mut sink);
        sink.finish()
    }

    /// Validate every annotation plus document-level structure.
    ///
    /// Unknown namespaces fail with `NamespaceNotFound` in either mode.
    pub fn validate_document(&self, document: &Jams) -> Result<ValidationReport, JamsError> {
        let mut sink = Collector::new(self.mode);
        let mut report = ValidationReport::default();

        let file_duration = document.file_metadata.duration;
        if let Some(duration) = file_duration {
            if !duration.is_finite() || duration < 0.0 {
                sink.report(SchemaValidationError::new(
                    "file_metadata.duration",
                    "non-negative number or null",
                    Value::from(duration),
                ));
            }
        } else {
            report.warn(
                "file_metadata.duration",
                "duration is not set; time-range containment was not checked",
            );
        }

        if document.file_metadata.jams_version.is_empty() {
            report.warn("file_metadata.jams_version", "jams_version is empty");
        }

        for (index, annotation) in document.annotations.iter().enumerate() {
            let scope = format!("annotations[{index}]");
            let schema = self.registry.lookup(annotation.namespace())?;
            check_annotation(annotation, &schema, &scope, &mut sink);
            if sink.halted() {
                break;
            }

            if let Some(duration) = file_duration.filter(|d| d.is_finite() && *d >= 0.0) {
                check_containment(annotation, duration, &scope, &mut report);
            }
        }

        sink.finish()?;
        Ok(report)
    }
}

/// Check one observation against `schema` without a registry.
pub fn validate_observation(
    observation: &Observation,
    schema: &NamespaceSchema,
    mode: ValidationMode,
) -> Result<(), JamsError> {
    let mut sink = Collector::new(mode);
    check_observation(observation, schema, "", &mut sink);
    sink.finish()
}

/// Check an arbitrary JSON value against a shape.
pub fn validate_value(
    value: &Value,
    shape: &ValueShape,
    mode: ValidationMode,
) -> Result<(), JamsError> {
    let mut sink = Collector::new(mode);
    check_value(value, shape, "", &mut sink);
    sink.finish()
}

struct Collector {
    mode: ValidationMode,
    violations: Vec<SchemaValidationError>,
}

impl Collector {
    fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            violations: Vec::new(),
        }
    }

    fn halted(&self) -> bool {
        self.mode == ValidationMode::FailFast && !self.violations.is_empty()
    }

    fn report(&mut self, violation: SchemaValidationError) {
        if !self.halted() {
            self.violations.push(violation);
        }
    }

    fn mismatch(&mut self, path: &str, shape: &ValueShape, actual: &Value) {
        self.report(SchemaValidationError::new(path, shape.to_string(), actual.clone()));
    }

    fn finish(self) -> Result<(), JamsError> {
        match Violations::from_vec(self.violations) {
            Some(violations) => Err(JamsError::SchemaValidation(violations)),
            None => Ok(()),
        }
    }
}

fn check_annotation(annotation: &Annotation, schema: &NamespaceSchema, scope: &str, sink: &mut Collector) {
    check_seconds(annotation.time, &join_path(scope, "time"), sink);
    if let Some(duration) = annotation.duration {
        check_seconds(duration, &join_path(scope, "duration"), sink);
    }

    let data_scope = join_path(scope, "data");
    let mut previous: Option<f64> = None;
    for (index, observation) in annotation.observations().iter().enumerate() {
        if sink.halted() {
            return;
        }
        let obs_scope = format!("{data_scope}[{index}]");
        check_observation(observation, schema, &obs_scope, sink);

        if schema.is_time_ordered() {
            if let Some(previous) = previous.filter(|p| observation.time < *p) {
                sink.report(SchemaValidationError::new(
                    join_path(&obs_scope, "time"),
                    format!("time >= {previous} (observations are time-ordered)"),
                    Value::from(observation.time),
                ));
            }
            previous = Some(observation.time);
        }
    }
}

fn check_observation(
    observation: &Observation,
    schema: &NamespaceSchema,
    scope: &str,
    sink: &mut Collector,
) {
    check_seconds(observation.time, &join_path(scope, "time"), sink);
    check_seconds(observation.duration, &join_path(scope, "duration"), sink);
    check_value(
        &observation.value,
        &schema.value_schema,
        &join_path(scope, "value"),
        sink,
    );
    check_value(
        &observation.confidence,
        &schema.confidence_schema,
        &join_path(scope, "confidence"),
        sink,
    );
}

fn check_seconds(seconds: f64, path: &str, sink: &mut Collector) {
    if !seconds.is_finite() || seconds < 0.0 {
        sink.report(SchemaValidationError::new(
            path,
            "non-negative finite number of seconds",
            Value::from(seconds),
        ));
    }
}

fn check_value(value: &Value, shape: &ValueShape, path: &str, sink: &mut Collector) {
    if sink.halted() {
        return;
    }

    match shape {
        ValueShape::Any => {}
        ValueShape::Null => {
            if !value.is_null() {
                sink.mismatch(path, shape, value);
            }
        }
        ValueShape::Boolean => {
            if !value.is_boolean() {
                sink.mismatch(path, shape, value);
            }
        }
        ValueShape::Integer { minimum, maximum } => {
            let Some(n) = as_integer(value) else {
                sink.mismatch(path, shape, value);
                return;
            };
            let below = minimum.is_some_and(|min| n < i128::from(min));
            let above = maximum.is_some_and(|max| n > i128::from(max));
            if below || above {
                sink.mismatch(path, shape, value);
            }
        }
        ValueShape::Number { minimum, maximum } => {
            let Some(x) = value.as_f64() else {
                sink.mismatch(path, shape, value);
                return;
            };
            let below = minimum.is_some_and(|min| x < min);
            let above = maximum.is_some_and(|max| x > max);
            if below || above {
                sink.mismatch(path, shape, value);
            }
        }
        ValueShape::String { pattern, values } => {
            let Some(text) = value.as_str() else {
                sink.mismatch(path, shape, value);
                return;
            };
            let listed = values.is_empty() || values.iter().any(|allowed| allowed == text);
            let matched = pattern.as_ref().map_or(true, |p| p.is_match(text));
            if !listed || !matched {
                sink.mismatch(path, shape, value);
            }
        }
        ValueShape::Array {
            items,
            min_items,
            max_items,
        } => {
            let Some(elements) = value.as_array() else {
                sink.mismatch(path, shape, value);
                return;
            };
            let len = elements.len();
            if min_items.is_some_and(|min| len < min) || max_items.is_some_and(|max| len > max) {
                sink.report(SchemaValidationError::new(
                    path,
                    length_expectation(*min_items, *max_items),
                    value.clone(),
                ));
            }
            for (index, element) in elements.iter().enumerate() {
                check_value(element, items, &format!("{path}[{index}]"), sink);
            }
        }
        ValueShape::Object {
            properties,
            required,
            additional_properties,
        } => {
            let Some(object) = value.as_object() else {
                sink.mismatch(path, shape, value);
                return;
            };
            check_object(object, properties, required, *additional_properties, path, sink);
        }
        ValueShape::OneOf { variants } => {
            let accepted = variants.iter().any(|variant| {
                let mut trial = Collector::new(ValidationMode::FailFast);
                check_value(value, variant, path, &mut trial);
                trial.violations.is_empty()
            });
            if !accepted {
                sink.mismatch(path, shape, value);
            }
        }
    }
}

fn check_object(
    object: &Map<String, Value>,
    properties: &std::collections::BTreeMap<String, ValueShape>,
    required: &[String],
    additional_properties: bool,
    path: &str,
    sink: &mut Collector,
) {
    for key in required {
        if !object.contains_key(key) {
            let expected = properties
                .get(key)
                .map_or_else(|| "required field".to_string(), |shape| format!("required {shape}"));
            sink.report(SchemaValidationError::new(join_path(path, key), expected, Value::Null));
        }
    }

    for (key, value) in object {
        match properties.get(key) {
            Some(shape) => check_value(value, shape, &join_path(path, key), sink),
            None if !additional_properties => sink.report(SchemaValidationError::new(
                join_path(path, key),
                "no undeclared properties",
                value.clone(),
            )),
            None => {}
        }
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    let Value::Number(number) = value else {
        return None;
    };
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn length_expectation(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) if min == max => format!("array of exactly {min} items"),
        (Some(min), Some(max)) => format!("array of {min} to {max} items"),
        (Some(min), None) => format!("array of at least {min} items"),
        (None, Some(max)) => format!("array of at most {max} items"),
        (None, None) => "array".to_string(),
    }
}

fn check_containment(annotation: &Annotation, file_duration: f64, scope: &str, report: &mut ValidationReport) {
    if let Some(end) = annotation.end_time().filter(|end| *end > file_duration) {
        report.warn(
            scope,
            format!("annotation range ends at {end}s, past file duration {file_duration}s"),
        );
    }

    let overflowing: Vec<f64> = annotation
        .observations()
        .iter()
        .map(Observation::end_time)
        .filter(|end| *end > file_duration)
        .collect();
    if let Some(latest) = overflowing.iter().copied().reduce(f64::max) {
        report.warn(
            join_path(scope, "data"),
            format!(
                "{} observation(s) extend past file duration {file_duration}s (latest end {latest}s)",
                overflowing.len()
            ),
        );
    }
}
