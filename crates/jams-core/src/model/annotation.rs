use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::observation::check_time;
use super::{AnnotationMetadata, Observation, Sandbox};
use crate::namespace::{NamespaceRegistry, NamespaceSchema};
use crate::validation::{validate_observation, ValidationMode};
use crate::JamsError;

/// A single-namespace collection of observations plus provenance.
///
/// The namespace is fixed at construction. When the namespace is time-ordered
/// the observations stay sorted by `time`, ties in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Annotation {
    namespace: String,
    #[serde(default)]
    data: Vec<Observation>,
    #[serde(default)]
    pub annotation_metadata: AnnotationMetadata,
    #[serde(default)]
    pub sandbox: Sandbox,
    /// Start of the annotated range in seconds.
    #[serde(default)]
    pub time: f64,
    /// Length of the annotated range; `None` covers the rest of the file.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(skip)]
    schema: Option<Arc<NamespaceSchema>>,
    #[serde(skip)]
    strict: bool,
}

impl Annotation {
    /// New empty annotation in a namespace of the global registry.
    pub fn new(namespace: &str) -> Result<Self, JamsError> {
        Self::in_registry(namespace, NamespaceRegistry::try_global()?)
    }

    /// New empty annotation in a namespace of `registry`.
    pub fn in_registry(namespace: &str, registry: &NamespaceRegistry) -> Result<Self, JamsError> {
        let schema = registry.lookup(namespace)?;
        let mut annotation = Self::unbound(namespace);
        annotation.schema = Some(schema);
        Ok(annotation)
    }

    pub(crate) fn unbound(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            data: Vec::new(),
            annotation_metadata: AnnotationMetadata::default(),
            sandbox: Sandbox::new(),
            time: 0.0,
            duration: None,
            schema: None,
            strict: false,
        }
    }

    /// Attach the namespace schema from `registry` and restore time order.
    ///
    /// Unknown namespaces stay unbound so malformed documents remain loadable.
    pub(crate) fn bind(&mut self, registry: &NamespaceRegistry) {
        let Ok(schema) = registry.lookup(&self.namespace) else {
            return;
        };
        if schema.is_time_ordered() {
            self.data.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        self.schema = Some(schema);
    }

    /// Validate each appended observation before insertion.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_metadata(mut self, metadata: AnnotationMetadata) -> Self {
        self.annotation_metadata = metadata;
        self
    }

    pub fn with_sandbox(mut self, sandbox: Sandbox) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_range(mut self, time: f64, duration: Option<f64>) -> Result<Self, JamsError> {
        check_time("time", time)?;
        if let Some(duration) = duration {
            check_time("duration", duration)?;
        }
        self.time = time;
        self.duration = duration;
        Ok(self)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Schema bound at construction or load; `None` for unknown namespaces.
    pub fn schema(&self) -> Option<&NamespaceSchema> {
        self.schema.as_deref()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn observations(&self) -> &[Observation] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// End of the annotated range, when a duration is set.
    pub fn end_time(&self) -> Option<f64> {
        self.duration.map(|duration| self.time + duration)
    }

    /// Add an observation.
    ///
    /// In strict mode the observation is validated first and rejected on the
    /// first violation.
    pub fn append(&mut self, observation: Observation) -> Result<(), JamsError> {
        if self.strict {
            let schema = self
                .schema
                .as_deref()
                .ok_or_else(|| JamsError::namespace_not_found(&self.namespace))?;
            validate_observation(&observation, schema, ValidationMode::FailFast)?;
        }

        if self.is_time_ordered() {
            let index = self
                .data
                .partition_point(|existing| existing.time <= observation.time);
            self.data.insert(index, observation);
        } else {
            self.data.push(observation);
        }
        Ok(())
    }

    /// Append every observation, stopping at the first rejected one.
    pub fn extend(
        &mut self,
        observations: impl IntoIterator<Item = Observation>,
    ) -> Result<(), JamsError> {
        for observation in observations {
            self.append(observation)?;
        }
        Ok(())
    }

    pub fn retain(&mut self, keep: impl FnMut(&Observation) -> bool) {
        self.data.retain(keep);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Copy of this annotation keeping only observations that intersect
    /// `[start, end)`. Observations are not modified.
    pub fn slice(&self, start: f64, end: f64) -> Result<Self, JamsError> {
        check_window(start, end)?;
        let mut sliced = self.restricted_to(start, end);
        sliced.data = self
            .data
            .iter()
            .filter(|obs| obs.intersects(start, end))
            .cloned()
            .collect();
        Ok(sliced)
    }

    /// Like [`slice`](Self::slice), but clips each observation to the window
    /// and records the window under `sandbox.trim`.
    pub fn trim(&self, start: f64, end: f64) -> Result<Self, JamsError> {
        check_window(start, end)?;
        let mut trimmed = self.restricted_to(start, end);
        trimmed.data = self
            .data
            .iter()
            .filter(|obs| obs.intersects(start, end))
            .map(|obs| {
                let clipped_start = obs.time.max(start);
                let clipped_end = obs.end_time().min(end);
                Observation {
                    time: clipped_start,
                    duration: (clipped_end - clipped_start).max(0.0),
                    value: obs.value.clone(),
                    confidence: obs.confidence.clone(),
                }
            })
            .collect();
        trimmed
            .sandbox
            .push_to("trim", json!({ "start_time": start, "end_time": end }));
        Ok(trimmed)
    }

    fn restricted_to(&self, start: f64, end: f64) -> Self {
        let range_start = self.time.max(start);
        let range_end = self.end_time().map_or(end, |own_end| own_end.min(end));
        Self {
            namespace: self.namespace.clone(),
            data: Vec::new(),
            annotation_metadata: self.annotation_metadata.clone(),
            sandbox: self.sandbox.clone(),
            time: range_start,
            duration: Some((range_end - range_start).max(0.0)),
            schema: self.schema.clone(),
            strict: self.strict,
        }
    }

    fn is_time_ordered(&self) -> bool {
        self.schema
            .as_deref()
            .is_some_and(NamespaceSchema::is_time_ordered)
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.data == other.data
            && self.annotation_metadata == other.annotation_metadata
            && self.sandbox == other.sandbox
            && self.time == other.time
            && self.duration == other.duration
    }
}

pub(crate) fn check_window(start: f64, end: f64) -> Result<(), JamsError> {
    check_time("start", start)?;
    check_time("end", end)?;
    if end < start {
        return Err(JamsError::parameter(format!(
            "window end {end} precedes start {start}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obs(time: f64, value: serde_json::Value) -> Observation {
        Observation::new(time, 0.0, value, json!(null)).expect("valid observation")
    }

    #[test]
    fn unknown_namespace_is_rejected() {
        let err = Annotation::new("no_such_namespace").expect_err("must fail");
        assert!(matches!(err, JamsError::NamespaceNotFound { .. }));
    }

    #[test]
    fn time_ordered_append_is_sorted_and_stable() {
        let mut ann = Annotation::new("segment_open").expect("built-in");
        ann.append(obs(2.0, json!("b"))).expect("append");
        ann.append(obs(1.0, json!("a"))).expect("append");
        ann.append(obs(2.0, json!("c"))).expect("append");
        ann.append(obs(0.5, json!("z"))).expect("append");

        let values: Vec<_> = ann.observations().iter().map(|o| o.value.clone()).collect();
        assert_eq!(values, vec![json!("z"), json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn unordered_namespace_keeps_insertion_order() {
        let mut ann = Annotation::new("tag_open").expect("built-in");
        ann.append(obs(3.0, json!("late"))).expect("append");
        ann.append(obs(1.0, json!("early"))).expect("append");

        assert_eq!(ann.observations()[0].value, json!("late"));
        assert_eq!(ann.observations()[1].value, json!("early"));
    }

    #[test]
    fn strict_append_rejects_invalid_value() {
        let mut ann = Annotation::new("beat").expect("built-in").strict(true);
        let err = ann
            .append(obs(0.5, json!("not-a-number")))
            .expect_err("must fail");

        let violations = err.violations().expect("schema violation");
        assert_eq!(violations.first().field, "value");
        assert!(ann.is_empty());
    }

    #[test]
    fn lenient_append_defers_validation() {
        let mut ann = Annotation::new("beat").expect("built-in");
        ann.append(obs(0.5, json!("not-a-number"))).expect("deferred");
        assert_eq!(ann.len(), 1);
    }

    #[test]
    fn slice_keeps_intersecting_observations_untouched() {
        let mut ann = Annotation::new("segment_open").expect("built-in");
        ann.extend([
            Observation::new(0.0, 2.0, json!("intro"), json!(null)).expect("valid"),
            Observation::new(2.0, 4.0, json!("verse"), json!(null)).expect("valid"),
            Observation::new(6.0, 4.0, json!("chorus"), json!(null)).expect("valid"),
        ])
        .expect("extend");

        let sliced = ann.slice(1.0, 5.0).expect("slice");
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.observations()[0].time, 0.0);
        assert_eq!(sliced.observations()[1].duration, 4.0);
        assert_eq!(sliced.time, 1.0);
        assert_eq!(sliced.duration, Some(4.0));
        assert_eq!(ann.len(), 3, "source annotation is untouched");
    }

    #[test]
    fn trim_clips_observations_and_records_window() {
        let mut ann = Annotation::new("segment_open").expect("built-in");
        ann.append(Observation::new(0.0, 4.0, json!("intro"), json!(null)).expect("valid"))
            .expect("append");

        let trimmed = ann.trim(1.0, 3.0).expect("trim");
        assert_eq!(trimmed.observations()[0].time, 1.0);
        assert_eq!(trimmed.observations()[0].duration, 2.0);
        assert_eq!(
            trimmed.sandbox.get("trim"),
            Some(&json!([{ "start_time": 1.0, "end_time": 3.0 }]))
        );
    }

    #[test]
    fn slice_rejects_inverted_window() {
        let ann = Annotation::new("beat").expect("built-in");
        assert!(matches!(ann.slice(3.0, 1.0), Err(JamsError::Parameter { .. })));
        assert!(matches!(ann.slice(-1.0, 1.0), Err(JamsError::Parameter { .. })));
    }
}
