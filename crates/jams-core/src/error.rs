use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A single structural violation found while validating an observation,
/// annotation, or document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaValidationError {
    /// Dotted path to the offending field, e.g. `data[2].value.root`.
    pub field: String,
    /// Human description of the expected shape.
    pub expected: String,
    /// The value actually found.
    pub actual: Value,
}

impl SchemaValidationError {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: Value) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual,
        }
    }

    /// Prefix the field path, used when an error bubbles up from a nested scope.
    pub(crate) fn within(mut self, scope: &str) -> Self {
        self.field = join_path(scope, &self.field);
        self
    }
}

impl Display for SchemaValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.field, self.expected, self.actual
        )
    }
}

impl std::error::Error for SchemaValidationError {}

/// Non-empty list of schema violations.
///
/// Fail-fast validation produces exactly one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Violations {
    first: SchemaValidationError,
    rest: Vec<SchemaValidationError>,
}

impl Violations {
    pub fn single(error: SchemaValidationError) -> Self {
        Self {
            first: error,
            rest: Vec::new(),
        }
    }

    /// Returns `None` when `errors` is empty.
    pub fn from_vec(errors: Vec<SchemaValidationError>) -> Option<Self> {
        let mut iter = errors.into_iter();
        let first = iter.next()?;
        Some(Self {
            first,
            rest: iter.collect(),
        })
    }

    pub fn first(&self) -> &SchemaValidationError {
        &self.first
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaValidationError> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    pub fn into_vec(self) -> Vec<SchemaValidationError> {
        let mut errors = Vec::with_capacity(self.len());
        errors.push(self.first);
        errors.extend(self.rest);
        errors
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.rest.is_empty() {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{} (and {} more)", self.first, self.rest.len())
        }
    }
}

/// Top-level error type for registry, model, validation and serialization
/// operations.
#[derive(Debug, Error)]
pub enum JamsError {
    #[error("namespace '{name}' is not registered")]
    NamespaceNotFound { name: String },

    #[error("namespace '{name}' is already registered with a different definition")]
    NamespaceCollision { name: String },

    #[error("schema validation failed: {0}")]
    SchemaValidation(Violations),

    #[error("document does not match the JAMS structure: {detail}")]
    SchemaMismatch { detail: String },

    #[error("invalid parameter: {message}")]
    Parameter { message: String },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JamsError {
    pub(crate) fn namespace_not_found(name: &str) -> Self {
        Self::NamespaceNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn parameter(message: impl Into<String>) -> Self {
        Self::Parameter {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            detail: detail.into(),
        }
    }

    /// The collected violations when this is a schema validation failure.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::SchemaValidation(violations) => Some(violations),
            _ => None,
        }
    }
}

impl From<SchemaValidationError> for JamsError {
    fn from(error: SchemaValidationError) -> Self {
        Self::SchemaValidation(Violations::single(error))
    }
}

pub(crate) fn join_path(scope: &str, field: &str) -> String {
    match (scope.is_empty(), field.is_empty()) {
        (true, _) => field.to_string(),
        (_, true) => scope.to_string(),
        _ if field.starts_with('[') => format!("{scope}{field}"),
        _ => format!("{scope}.{field}"),
    }
}
