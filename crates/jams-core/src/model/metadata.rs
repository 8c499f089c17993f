use serde::{Deserialize, Serialize};

use super::Sandbox;
use crate::JamsError;

/// Format version written into new documents.
pub const JAMS_VERSION: &str = "0.3.4";

/// Person or organization responsible for an annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Curator {
    pub name: String,
    pub email: String,
}

impl Curator {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Provenance for a single annotation.
///
/// Every field serializes even when empty so annotation objects keep the
/// same shape across namespaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotationMetadata {
    pub curator: Curator,
    /// Free-form description of who or what produced the annotation.
    pub annotator: Sandbox,
    pub version: String,
    pub corpus: String,
    pub annotation_tools: String,
    pub annotation_rules: String,
    pub validation: String,
    pub data_source: String,
}

impl AnnotationMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_curator(mut self, curator: Curator) -> Self {
        self.curator = curator;
        self
    }

    pub fn with_annotator(mut self, annotator: Sandbox) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_corpus(mut self, corpus: impl Into<String>) -> Self {
        self.corpus = corpus.into();
        self
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }
}

/// Metadata describing the audio file a document annotates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileMetadata {
    pub title: String,
    pub artist: String,
    pub release: String,
    /// Track duration in seconds, when known.
    pub duration: Option<f64>,
    pub identifiers: Sandbox,
    pub jams_version: String,
}

impl Default for FileMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            release: String::new(),
            duration: None,
            identifiers: Sandbox::new(),
            jams_version: JAMS_VERSION.to_string(),
        }
    }
}

impl FileMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Result<Self, JamsError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(JamsError::parameter(format!(
                "file duration must be a non-negative finite number, got {duration}"
            )));
        }
        self.duration = Some(duration);
        Ok(self)
    }

    pub fn with_identifiers(mut self, identifiers: Sandbox) -> Self {
        self.identifiers = identifiers;
        self
    }
}
