use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::JamsError;

/// Structural contract for an observation's `value` or `confidence`.
///
/// Shapes are data: namespace definition files describe them as JSON objects
/// tagged by `"type"`, so adding a namespace never needs new validation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueShape {
    Any,
    Null,
    Boolean,
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<Pattern>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<String>,
    },
    Array {
        items: Box<ValueShape>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    Object {
        #[serde(default)]
        properties: BTreeMap<String, ValueShape>,
        #[serde(default)]
        required: Vec<String>,
        #[serde(default = "default_true")]
        additional_properties: bool,
    },
    OneOf {
        variants: Vec<ValueShape>,
    },
}

fn default_true() -> bool {
    true
}

impl ValueShape {
    pub fn number() -> Self {
        Self::Number {
            minimum: None,
            maximum: None,
        }
    }

    pub fn bounded_number(minimum: f64, maximum: f64) -> Self {
        Self::Number {
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    pub fn integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
        }
    }

    pub fn string() -> Self {
        Self::String {
            pattern: None,
            values: Vec::new(),
        }
    }

    pub fn array_of(items: ValueShape) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// `shape` or `null`.
    pub fn nullable(shape: ValueShape) -> Self {
        Self::OneOf {
            variants: vec![shape, Self::Null],
        }
    }

    /// Checks that bounds are ordered and composite shapes are well formed.
    pub(crate) fn check_definition(&self, path: &str) -> Result<(), JamsError> {
        match self {
            Self::Integer {
                minimum: Some(min),
                maximum: Some(max),
            } if min > max => Err(JamsError::parameter(format!(
                "{path}: integer minimum {min} exceeds maximum {max}"
            ))),
            Self::Number { minimum, maximum } => {
                if minimum.is_some_and(|v| !v.is_finite()) || maximum.is_some_and(|v| !v.is_finite())
                {
                    return Err(JamsError::parameter(format!(
                        "{path}: number bounds must be finite"
                    )));
                }
                match (minimum, maximum) {
                    (Some(min), Some(max)) if min > max => Err(JamsError::parameter(format!(
                        "{path}: number minimum {min} exceeds maximum {max}"
                    ))),
                    _ => Ok(()),
                }
            }
            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                if let (Some(min), Some(max)) = (min_items, max_items) {
                    if min > max {
                        return Err(JamsError::parameter(format!(
                            "{path}: min_items {min} exceeds max_items {max}"
                        )));
                    }
                }
                items.check_definition(&format!("{path}.items"))
            }
            Self::Object {
                properties,
                required,
                additional_properties,
            } => {
                if !additional_properties {
                    if let Some(missing) = required.iter().find(|key| !properties.contains_key(*key)) {
                        return Err(JamsError::parameter(format!(
                            "{path}: required property '{missing}' is not declared"
                        )));
                    }
                }
                for (key, shape) in properties {
                    shape.check_definition(&format!("{path}.{key}"))?;
                }
                Ok(())
            }
            Self::OneOf { variants } => {
                if variants.is_empty() {
                    return Err(JamsError::parameter(format!(
                        "{path}: one_of needs at least one variant"
                    )));
                }
                for (index, variant) in variants.iter().enumerate() {
                    variant.check_definition(&format!("{path}[{index}]"))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl Display for ValueShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any value"),
            Self::Null => f.write_str("null"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer { minimum, maximum } => {
                f.write_str("integer")?;
                write_bounds(f, minimum.map(|v| v.to_string()), maximum.map(|v| v.to_string()))
            }
            Self::Number { minimum, maximum } => {
                f.write_str("number")?;
                write_bounds(f, minimum.map(|v| v.to_string()), maximum.map(|v| v.to_string()))
            }
            Self::String { pattern, values } => {
                if !values.is_empty() {
                    write!(f, "one of [{}]", values.join(", "))
                } else if let Some(pattern) = pattern {
                    write!(f, "string matching /{}/", pattern.as_str())
                } else {
                    f.write_str("string")
                }
            }
            Self::Array { items, .. } => write!(f, "array of {items}"),
            Self::Object { required, .. } if required.is_empty() => f.write_str("object"),
            Self::Object { required, .. } => write!(f, "object with {}", required.join(", ")),
            Self::OneOf { variants } => {
                for (index, variant) in variants.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{variant}")?;
                }
                Ok(())
            }
        }
    }
}

fn write_bounds(f: &mut Formatter<'_>, min: Option<String>, max: Option<String>) -> fmt::Result {
    match (min, max) {
        (Some(min), Some(max)) => write!(f, " in [{min}, {max}]"),
        (Some(min), None) => write!(f, " >= {min}"),
        (None, Some(max)) => write!(f, " <= {max}"),
        (None, None) => Ok(()),
    }
}

/// Compiled regular expression carried inside a string shape.
///
/// Serializes as its source text; two patterns are equal when their sources are.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(Regex);

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, JamsError> {
        Regex::new(source)
            .map(Self)
            .map_err(|err| JamsError::parameter(format!("invalid pattern '{source}': {err}")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl TryFrom<String> for Pattern {
    type Error = JamsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pattern> for String {
    fn from(value: Pattern) -> Self {
        value.as_str().to_string()
    }
}
