//! # Search
//!
//! Predicate-based filtering over annotations.
//!
//! A [`Query`] is a list of `(key path, matcher)` criteria combined with
//! logical AND. Key paths are dot-separated and address the annotation's
//! `namespace`, `time`, `duration`, `annotation_metadata.*` and `sandbox.*`,
//! plus `file_metadata.*` of the owning document when searching through a
//! [`Jams`]. Numeric segments index into arrays (`sandbox.tags.0`).
//!
//! A path that does not resolve never matches; heterogeneous sandbox
//! contents are expected.
//!
//! ```rust,ignore
//! use jams_core::{search, Query};
//!
//! let query = Query::new()
//!     .eq("namespace", "chord")
//!     .pattern("annotation_metadata.curator.name", "^Tom")?;
//! for annotation in search(&documents, &query) {
//!     println!("{}", annotation.annotation_metadata.corpus);
//! }
//! ```

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{Annotation, AnnotationMetadata, FileMetadata, Jams};
use crate::JamsError;

/// Test applied to the value found at a key path.
#[derive(Clone)]
pub enum Matcher {
    /// Value equals the given JSON value.
    Exact(Value),
    /// Value equals any of the given JSON values.
    OneOf(Vec<Value>),
    /// String value contains a match for the regex.
    Pattern(Regex),
    /// Arbitrary predicate.
    Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl Matcher {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Exact(expected) => value == expected,
            Self::OneOf(candidates) => candidates.iter().any(|candidate| candidate == value),
            Self::Pattern(regex) => value.as_str().is_some_and(|text| regex.is_match(text)),
            Self::Predicate(predicate) => predicate(value),
        }
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        Self::Exact(value)
    }
}

impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        Self::Exact(Value::from(value))
    }
}

impl From<Regex> for Matcher {
    fn from(value: Regex) -> Self {
        Self::Pattern(value)
    }
}

/// Conjunction of key-path criteria.
#[derive(Debug, Clone, Default)]
pub struct Query {
    criteria: Vec<(String, Matcher)>,
}

impl Query {
    /// Query with no criteria; matches every annotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `Query::new().eq("namespace", namespace)`.
    pub fn namespace(namespace: &str) -> Self {
        Self::new().eq("namespace", namespace)
    }

    pub fn with(mut self, path: impl Into<String>, matcher: impl Into<Matcher>) -> Self {
        self.criteria.push((path.into(), matcher.into()));
        self
    }

    pub fn eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Matcher::Exact(value.into()))
    }

    pub fn one_of<V: Into<Value>>(
        self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.with(path, Matcher::OneOf(values))
    }

    pub fn pattern(self, path: impl Into<String>, pattern: &str) -> Result<Self, JamsError> {
        let regex = Regex::new(pattern)
            .map_err(|err| JamsError::parameter(format!("invalid pattern '{pattern}': {err}")))?;
        Ok(self.with(path, Matcher::Pattern(regex)))
    }

    pub fn predicate(
        self,
        path: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with(path, Matcher::Predicate(Arc::new(predicate)))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Whether a standalone annotation satisfies every criterion.
    pub fn matches(&self, annotation: &Annotation) -> bool {
        self.matches_in(annotation, None)
    }

    fn matches_in(&self, annotation: &Annotation, file_metadata: Option<&FileMetadata>) -> bool {
        if self.criteria.is_empty() {
            return true;
        }

        let view = annotation_view(annotation, file_metadata);
        self.criteria.iter().all(|(path, matcher)| {
            resolve(&view, path).is_some_and(|value| matcher.matches(value))
        })
    }
}

/// Annotations paired with the metadata of the document that owns them.
pub type Candidates<'a> = Box<dyn Iterator<Item = (&'a Annotation, Option<&'a FileMetadata>)> + 'a>;

/// Collections that [`search`] can walk.
pub trait Searchable {
    fn candidates(&self) -> Candidates<'_>;
}

impl Searchable for Jams {
    fn candidates(&self) -> Candidates<'_> {
        let file_metadata = &self.file_metadata;
        Box::new(
            self.annotations
                .iter()
                .map(move |annotation| (annotation, Some(file_metadata))),
        )
    }
}

impl Searchable for [Jams] {
    fn candidates(&self) -> Candidates<'_> {
        Box::new(self.iter().flat_map(|jam| jam.candidates()))
    }
}

impl Searchable for Vec<Jams> {
    fn candidates(&self) -> Candidates<'_> {
        self.as_slice().candidates()
    }
}

impl Searchable for [Annotation] {
    fn candidates(&self) -> Candidates<'_> {
        Box::new(self.iter().map(|annotation| (annotation, None::<&FileMetadata>)))
    }
}

impl Searchable for Vec<Annotation> {
    fn candidates(&self) -> Candidates<'_> {
        self.as_slice().candidates()
    }
}

/// Lazily yield the annotations in `source` that satisfy `query`.
///
/// Inputs are not modified; calling again restarts the search.
pub fn search<'a, S>(source: &'a S, query: &'a Query) -> impl Iterator<Item = &'a Annotation> + 'a
where
    S: Searchable + ?Sized,
{
    debug!(criteria = query.criteria.len(), "searching annotations");
    source
        .candidates()
        .filter(move |(annotation, file_metadata)| query.matches_in(annotation, *file_metadata))
        .map(|(annotation, _)| annotation)
}

fn annotation_view(annotation: &Annotation, file_metadata: Option<&FileMetadata>) -> Value {
    let mut view = Map::new();
    view.insert("namespace".into(), Value::from(annotation.namespace()));
    view.insert("time".into(), Value::from(annotation.time));
    view.insert(
        "duration".into(),
        annotation.duration.map_or(Value::Null, Value::from),
    );
    view.insert(
        "annotation_metadata".into(),
        metadata_view(&annotation.annotation_metadata),
    );
    view.insert(
        "sandbox".into(),
        Value::Object(annotation.sandbox.as_map().clone()),
    );
    if let Some(file_metadata) = file_metadata {
        view.insert("file_metadata".into(), file_metadata_view(file_metadata));
    }
    Value::Object(view)
}

fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

fn metadata_view(metadata: &AnnotationMetadata) -> Value {
    object([
        (
            "curator",
            object([
                ("name", Value::from(metadata.curator.name.as_str())),
                ("email", Value::from(metadata.curator.email.as_str())),
            ]),
        ),
        ("annotator", Value::Object(metadata.annotator.as_map().clone())),
        ("version", Value::from(metadata.version.as_str())),
        ("corpus", Value::from(metadata.corpus.as_str())),
        ("annotation_tools", Value::from(metadata.annotation_tools.as_str())),
        ("annotation_rules", Value::from(metadata.annotation_rules.as_str())),
        ("validation", Value::from(metadata.validation.as_str())),
        ("data_source", Value::from(metadata.data_source.as_str())),
    ])
}

fn file_metadata_view(file_metadata: &FileMetadata) -> Value {
    object([
        ("title", Value::from(file_metadata.title.as_str())),
        ("artist", Value::from(file_metadata.artist.as_str())),
        ("release", Value::from(file_metadata.release.as_str())),
        (
            "duration",
            file_metadata.duration.map_or(Value::Null, Value::from),
        ),
        (
            "identifiers",
            Value::Object(file_metadata.identifiers.as_map().clone()),
        ),
        ("jams_version", Value::from(file_metadata.jams_version.as_str())),
    ])
}

fn resolve<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(object) => object.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}
