//! # Namespaces
//!
//! A namespace names one kind of annotation (`beat`, `chord`, `segment_open`,
//! ...) and fixes the structural contract of its observations' `value` and
//! `confidence` fields.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NamespaceSchema`] | Contract for one namespace |
//! | [`ValueShape`] | Structural grammar for `value`/`confidence` |
//! | [`NamespaceRegistry`] | Catalog of registered namespaces |
//!
//! Definitions are JSON documents keyed by namespace name:
//!
//! ```json
//! {
//!   "tempo": {
//!     "description": "Tempo estimates in beats per minute",
//!     "value": { "type": "number", "minimum": 0 },
//!     "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
//!     "ordering": "time"
//!   }
//! }
//! ```

mod builtin;
mod registry;
mod shape;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::JamsError;

pub use builtin::BUILTIN_DEFINITIONS;
pub use registry::NamespaceRegistry;
pub use shape::{Pattern, ValueShape};

/// How observations in an annotation are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationOrder {
    /// Non-decreasing by `time`; ties keep insertion order.
    #[default]
    Time,
    /// Insertion order is preserved as given.
    Unordered,
}

/// Registered contract for one annotation namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceSchema {
    #[serde(default, skip_serializing)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "value")]
    pub value_schema: ValueShape,
    #[serde(rename = "confidence", default = "any_shape")]
    pub confidence_schema: ValueShape,
    #[serde(default)]
    pub ordering: ObservationOrder,
    #[serde(default)]
    pub dense: bool,
}

fn any_shape() -> ValueShape {
    ValueShape::Any
}

impl NamespaceSchema {
    pub fn new(
        name: impl Into<String>,
        value_schema: ValueShape,
        confidence_schema: ValueShape,
    ) -> Result<Self, JamsError> {
        let schema = Self {
            name: name.into(),
            description: String::new(),
            value_schema,
            confidence_schema,
            ordering: ObservationOrder::Time,
            dense: false,
        };
        schema.check()?;
        Ok(schema)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ordering(mut self, ordering: ObservationOrder) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_dense(mut self, dense: bool) -> Self {
        self.dense = dense;
        self
    }

    pub fn is_time_ordered(&self) -> bool {
        self.ordering == ObservationOrder::Time
    }

    pub(crate) fn check(&self) -> Result<(), JamsError> {
        validate_namespace_name(&self.name)?;
        self.value_schema.check_definition(&format!("{}.value", self.name))?;
        self.confidence_schema
            .check_definition(&format!("{}.confidence", self.name))
    }
}

/// Parses a definition document (`{ name: definition, ... }`) into schemas.
pub fn parse_definitions(text: &str) -> Result<Vec<NamespaceSchema>, JamsError> {
    let raw: BTreeMap<String, NamespaceSchema> = serde_json::from_str(text)
        .map_err(|err| JamsError::parameter(format!("invalid namespace definition: {err}")))?;

    raw.into_iter()
        .map(|(key, mut schema)| {
            if !schema.name.is_empty() && schema.name != key {
                return Err(JamsError::parameter(format!(
                    "namespace key '{key}' does not match declared name '{}'",
                    schema.name
                )));
            }
            schema.name = key;
            schema.check()?;
            Ok(schema)
        })
        .collect()
}

fn validate_namespace_name(name: &str) -> Result<(), JamsError> {
    if name.is_empty() {
        return Err(JamsError::parameter("namespace name cannot be empty"));
    }

    if let Some((index, ch)) = name
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-'))
    {
        return Err(JamsError::parameter(format!(
            "namespace '{name}' contains invalid character '{ch}' at index {index}"
        )));
    }

    Ok(())
}
