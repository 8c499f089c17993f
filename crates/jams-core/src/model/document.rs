use serde::{Deserialize, Serialize};
use serde_json::json;

use super::annotation::check_window;
use super::{Annotation, FileMetadata, Sandbox};
use crate::search::{search, Query};
use crate::validation::{ValidationReport, Validator};
use crate::JamsError;

/// Top-level JAMS document: file metadata, annotations and a free-form sandbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Jams {
    pub file_metadata: FileMetadata,
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub sandbox: Sandbox,
}

impl Jams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_metadata(mut self, file_metadata: FileMetadata) -> Self {
        self.file_metadata = file_metadata;
        self
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Annotations of this document matching `query`, in document order.
    pub fn search<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = &'a Annotation> + 'a {
        search(self, query)
    }

    pub fn validate(&self, validator: &Validator<'_>) -> Result<ValidationReport, JamsError> {
        validator.validate_document(self)
    }

    /// Copy with every annotation sliced to `[start, end)`.
    pub fn slice(&self, start: f64, end: f64) -> Result<Self, JamsError> {
        self.restrict(start, end, "slice", Annotation::slice)
    }

    /// Copy with every annotation trimmed to `[start, end)`.
    pub fn trim(&self, start: f64, end: f64) -> Result<Self, JamsError> {
        self.restrict(start, end, "trim", Annotation::trim)
    }

    fn restrict(
        &self,
        start: f64,
        end: f64,
        key: &str,
        op: impl Fn(&Annotation, f64, f64) -> Result<Annotation, JamsError>,
    ) -> Result<Self, JamsError> {
        check_window(start, end)?;
        let annotations = self
            .annotations
            .iter()
            .map(|annotation| op(annotation, start, end))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sandbox = self.sandbox.clone();
        sandbox.push_to(key, json!({ "start_time": start, "end_time": end }));

        Ok(Self {
            file_metadata: self.file_metadata.clone(),
            annotations,
            sandbox,
        })
    }
}
