use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form, unvalidated auxiliary data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sandbox(Map<String, Value>);

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Append `entry` to the array stored under `key`, creating it when absent.
    ///
    /// A non-array value under `key` is replaced.
    pub(crate) fn push_to(&mut self, key: &str, entry: Value) {
        match self.0.get_mut(key) {
            Some(Value::Array(items)) => items.push(entry),
            _ => {
                self.0.insert(key.to_string(), Value::Array(vec![entry]));
            }
        }
    }
}

impl From<Map<String, Value>> for Sandbox {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl From<Sandbox> for Value {
    fn from(value: Sandbox) -> Self {
        Value::Object(value.0)
    }
}
