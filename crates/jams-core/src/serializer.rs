//! # Serialization
//!
//! Conversion between [`Jams`] documents and the JAMS JSON wire format.
//!
//! Loading checks only the document's structure. Namespace validation is a
//! separate, explicit step so malformed documents can still be inspected.
//!
//! Every JAMS object has a fixed key set. Keys outside it are rejected on
//! load rather than dropped, so a loaded document writes back unchanged.
//!
//! Absent optional values (a missing confidence, an unknown duration) are
//! written as `null`, never omitted, so every annotation object has the same
//! keys regardless of namespace.

use std::io::{Read, Write};

use serde_json::Value;
use tracing::debug;

use crate::model::Jams;
use crate::namespace::NamespaceRegistry;
use crate::JamsError;

/// Top-level keys a document must carry.
pub const REQUIRED_KEYS: [&str; 2] = ["file_metadata", "annotations"];

/// Parse a document, binding annotations to the global registry.
pub fn from_json(text: &str) -> Result<Jams, JamsError> {
    from_json_with(text, NamespaceRegistry::try_global()?)
}

pub fn from_json_with(text: &str, registry: &NamespaceRegistry) -> Result<Jams, JamsError> {
    let value: Value = serde_json::from_str(text)?;
    from_value_with(value, registry)
}

pub fn from_value(value: Value) -> Result<Jams, JamsError> {
    from_value_with(value, NamespaceRegistry::try_global()?)
}

/// Build a document from parsed JSON.
///
/// Fails with `SchemaMismatch` when required keys are missing, structural
/// fields have the wrong JSON type, or an object carries a key the JAMS
/// layout does not define. Free-form data belongs in a `sandbox`. Observations of time-ordered namespaces
/// are sorted by time; annotations in unknown namespaces load as-is.
pub fn from_value_with(value: Value, registry: &NamespaceRegistry) -> Result<Jams, JamsError> {
    {
        let object = value
            .as_object()
            .ok_or_else(|| JamsError::mismatch("top-level JSON value must be an object"))?;

        for key in REQUIRED_KEYS {
            if !object.contains_key(key) {
                return Err(JamsError::mismatch(format!("missing required key '{key}'")));
            }
        }
    }

    let mut document: Jams =
        serde_json::from_value(value).map_err(|err| JamsError::mismatch(err.to_string()))?;
    for annotation in &mut document.annotations {
        annotation.bind(registry);
    }

    debug!(
        annotations = document.annotations.len(),
        "loaded document"
    );
    Ok(document)
}

/// Read and parse a document from any byte source.
pub fn from_reader(mut reader: impl Read) -> Result<Jams, JamsError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    from_json(&text)
}

pub fn to_value(document: &Jams) -> Result<Value, JamsError> {
    Ok(serde_json::to_value(document)?)
}

/// Compact JSON text.
pub fn to_json(document: &Jams) -> Result<String, JamsError> {
    Ok(serde_json::to_string(document)?)
}

/// Indented JSON text.
pub fn to_json_pretty(document: &Jams) -> Result<String, JamsError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Write the document as indented JSON.
pub fn to_writer(mut writer: impl Write, document: &Jams) -> Result<(), JamsError> {
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.flush()?;
    debug!(annotations = document.annotations.len(), "wrote document");
    Ok(())
}
