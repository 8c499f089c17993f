//! # JAMS Core
//!
//! Data model, namespace registry, validation and search for JAMS documents:
//! JSON files bundling time-aligned annotations (beats, chords, segments,
//! tags, ...) of a music recording together with provenance metadata.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`namespace`] | Namespace schemas, value shapes, registry, built-ins |
//! | [`model`] | Observations, annotations, metadata, documents |
//! | [`validation`] | Schema-driven validation with fail-fast or accumulate modes |
//! | [`search`] | Key-path queries over annotations and documents |
//! | [`serializer`] | JSON wire format |
//! | [`config`] | Runtime options |
//! | [`error`] | Error taxonomy |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jams_core::{from_json, Query, Validator};
//!
//! let jam = from_json(&text)?;
//! let report = jam.validate(&Validator::global())?;
//! for beat in jam.search(&Query::namespace("beat")) {
//!     println!("{} beats", beat.len());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐
//! │ Serializer       │─────▶│ Jams / Annotation│
//! │ (from/to JSON)   │      │ / Observation    │
//! └────────┬─────────┘      └───┬──────────┬───┘
//!          │ bind               │          │
//!          ▼                    ▼          ▼
//! ┌──────────────────┐   ┌───────────┐ ┌────────┐
//! │ NamespaceRegistry│◀──│ Validator │ │ Search │
//! └──────────────────┘   └───────────┘ └────────┘
//! ```
//!
//! Namespace contracts are data ([`ValueShape`] trees), so registering a new
//! namespace needs no validator changes.

pub mod config;
pub mod error;
pub mod model;
pub mod namespace;
pub mod search;
pub mod serializer;
pub mod validation;

pub use config::JamsConfig;
pub use error::{JamsError, SchemaValidationError, Violations};
pub use model::{
    Annotation, AnnotationMetadata, Curator, FileMetadata, Jams, Observation, Sandbox,
    JAMS_VERSION,
};
pub use namespace::{
    parse_definitions, NamespaceRegistry, NamespaceSchema, ObservationOrder, Pattern, ValueShape,
};
pub use search::{search, Matcher, Query, Searchable};
pub use serializer::{
    from_json, from_json_with, from_reader, from_value, from_value_with, to_json, to_json_pretty,
    to_value, to_writer,
};
pub use validation::{
    validate_observation, validate_value, ValidationMode, ValidationReport, ValidationWarning,
    Validator,
};
