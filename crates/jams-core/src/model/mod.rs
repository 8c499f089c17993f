//! # Annotation Model
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Jams`] | Document: file metadata, annotations, sandbox |
//! | [`Annotation`] | Single-namespace observation collection |
//! | [`Observation`] | Time, duration, value, confidence |
//! | [`AnnotationMetadata`] | Curator, annotator, corpus, version, data source |
//! | [`FileMetadata`] | Title, artist, release, duration, identifiers |
//! | [`Sandbox`] | Unvalidated free-form data |
//!
//! Times and durations are seconds. Constructors reject negative or
//! non-finite times with [`JamsError::Parameter`](crate::JamsError::Parameter).

mod annotation;
mod document;
mod metadata;
mod observation;
mod sandbox;

pub use annotation::Annotation;
pub use document::Jams;
pub use metadata::{AnnotationMetadata, Curator, FileMetadata, JAMS_VERSION};
pub use observation::Observation;
pub use sandbox::Sandbox;
