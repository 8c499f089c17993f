//! Contract tests for the JAMS JSON wire format
//!
//! These tests pin the document layout produced and accepted by the
//! serializer so files written by one version stay readable by the next.

use jams_core::{
    from_json, from_json_with, from_reader, to_json, to_json_pretty, to_value, to_writer,
    Annotation, AnnotationMetadata, Curator, FileMetadata, Jams, JamsError, NamespaceRegistry,
    Observation, Query, Validator, JAMS_VERSION,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs::File;
use tempfile::tempdir;

const CHORD_DOCUMENT: &str = r#"{
    "file_metadata": {
        "title": "Let It Be",
        "artist": "The Beatles",
        "release": "Let It Be",
        "duration": 243.0,
        "identifiers": { "musicbrainz": "0b2b4f9e" },
        "jams_version": "0.3.4"
    },
    "annotations": [
        {
            "namespace": "chord",
            "data": [
                { "time": 2.5, "duration": 2.5, "value": "G:maj", "confidence": 1.0 },
                { "time": 0.0, "duration": 2.5, "value": "C:maj", "confidence": 1.0 }
            ],
            "annotation_metadata": {
                "curator": { "name": "Chris Harte", "email": "" },
                "annotator": {},
                "version": "1.0",
                "corpus": "Isophonics",
                "annotation_tools": "",
                "annotation_rules": "",
                "validation": "",
                "data_source": "manual"
            },
            "sandbox": { "reviewed": true },
            "time": 0.0,
            "duration": 243.0
        }
    ],
    "sandbox": { "source": "contract-test" }
}"#;

fn sample_document() -> Jams {
    let mut beats = Annotation::new("beat")
        .expect("beat is built in")
        .with_metadata(
            AnnotationMetadata::new()
                .with_curator(Curator::new("Tom", "tom@example.com"))
                .with_version("2")
                .with_data_source("beat tracker"),
        );
    beats
        .extend([
            Observation::new(0.1, 0.0, json!(1), json!(0.3)).expect("observation"),
            Observation::new(0.6, 0.0, json!(2), json!(null)).expect("observation"),
            Observation::new(1.1, 0.0, json!(null), json!(0.7)).expect("observation"),
        ])
        .expect("extend");

    let mut jam = Jams::new().with_file_metadata(
        FileMetadata::new()
            .with_title("Sample")
            .with_artist("Nobody")
            .with_duration(30.0)
            .expect("duration"),
    );
    jam.push(beats);
    jam
}

// =============================================================================
// Contract: Loading
// =============================================================================

#[test]
fn when_a_chord_file_is_loaded_it_is_valid_sorted_and_searchable() {
    // Given: A chord document written by another tool
    // When: It is loaded
    let jam = from_json(CHORD_DOCUMENT).expect("loads");

    // Then: Observations are sorted, the document validates, search finds it
    let values: Vec<&str> = jam.annotations[0]
        .observations()
        .iter()
        .filter_map(|obs| obs.value.as_str())
        .collect();
    assert_eq!(values, vec!["C:maj", "G:maj"]);

    let report = jam.validate(&Validator::global()).expect("valid");
    assert!(report.is_clean());

    let query = Query::namespace("chord").eq("annotation_metadata.corpus", "Isophonics");
    assert_eq!(jam.search(&query).count(), 1);
    assert_eq!(jam.sandbox.get("source"), Some(&json!("contract-test")));
}

#[test]
fn when_annotations_key_is_missing_loading_fails_with_schema_mismatch() {
    let err = from_json(r#"{ "file_metadata": {}, "sandbox": {} }"#).expect_err("must fail");

    assert!(matches!(err, JamsError::SchemaMismatch { .. }));
    assert!(err.to_string().contains("annotations"));
}

#[test]
fn when_observation_time_has_wrong_type_loading_fails_with_schema_mismatch() {
    let err = from_json(
        r#"{
            "file_metadata": {},
            "annotations": [{
                "namespace": "beat",
                "data": [{ "time": "zero", "duration": 0.0, "value": 1 }]
            }]
        }"#,
    )
    .expect_err("must fail");

    assert!(matches!(err, JamsError::SchemaMismatch { .. }));
}

#[test]
fn when_value_is_invalid_loading_succeeds_but_validation_fails() {
    let text = CHORD_DOCUMENT.replace("G:maj", "not a chord");

    let jam = from_json(&text).expect("structure is fine");
    let err = jam.validate(&Validator::global()).expect_err("value is not");

    let violation = err.violations().expect("violations").first().clone();
    assert_eq!(violation.field, "annotations[0].data[1].value");
}

#[test]
fn when_any_object_carries_an_unknown_key_loading_fails_with_schema_mismatch() {
    // Given: A valid chord document
    let base: Value = serde_json::from_str(CHORD_DOCUMENT).expect("fixture parses");
    let placements = [
        ("top_extra", ""),
        ("album", "/file_metadata"),
        ("extra_ann", "/annotations/0"),
        ("annotator_notes", "/annotations/0/annotation_metadata"),
        ("affiliation", "/annotations/0/annotation_metadata/curator"),
        ("label", "/annotations/0/data/0"),
    ];

    for (key, pointer) in placements {
        // When: One object gains a key outside the JAMS layout
        let mut document = base.clone();
        document
            .pointer_mut(pointer)
            .and_then(Value::as_object_mut)
            .expect("object at pointer")
            .insert(key.to_string(), json!("extra-key"));

        // Then: Loading refuses it instead of dropping the key
        let err = from_json(&document.to_string()).expect_err("unknown key must be rejected");
        assert!(
            matches!(err, JamsError::SchemaMismatch { ref detail } if detail.contains(key)),
            "{key}: unexpected error {err:?}"
        );
    }
}

#[test]
fn when_a_loaded_document_is_written_back_the_json_is_unchanged() {
    let original: Value = serde_json::from_str(CHORD_DOCUMENT).expect("fixture parses");

    let written = to_value(&from_json(CHORD_DOCUMENT).expect("loads")).expect("serializes");

    // Observations come back in time order; everything else is identical.
    let mut expected = original;
    let data = expected["annotations"][0]["data"]
        .as_array_mut()
        .expect("data array");
    data.swap(0, 1);
    assert_eq!(written, expected);
}

#[test]
fn when_loaded_with_a_private_registry_custom_namespaces_bind() {
    let registry = NamespaceRegistry::new();
    registry
        .register_definitions(
            r#"{ "lab_marker": { "value": { "type": "string" }, "ordering": "unordered" } }"#,
        )
        .expect("registers");

    let jam = from_json_with(
        r#"{
            "file_metadata": { "duration": 5.0 },
            "annotations": [{
                "namespace": "lab_marker",
                "data": [
                    { "time": 3.0, "duration": 0.0, "value": "b" },
                    { "time": 1.0, "duration": 0.0, "value": "a" }
                ]
            }]
        }"#,
        &registry,
    )
    .expect("loads");

    let annotation = &jam.annotations[0];
    assert!(annotation.schema().is_some());
    let times: Vec<f64> = annotation.observations().iter().map(|obs| obs.time).collect();
    assert_eq!(times, vec![3.0, 1.0]);
}

// =============================================================================
// Contract: Writing
// =============================================================================

#[test]
fn when_a_document_is_written_every_key_is_present() {
    let value = to_value(&sample_document()).expect("serializes");

    let annotation = &value["annotations"][0];
    let mut keys: Vec<&str> = annotation
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["annotation_metadata", "data", "duration", "namespace", "sandbox", "time"]
    );
    assert_eq!(annotation["duration"], Value::Null);
    assert_eq!(annotation["data"][1]["confidence"], Value::Null);
    assert_eq!(value["file_metadata"]["jams_version"], json!(JAMS_VERSION));
}

#[test]
fn when_a_document_round_trips_through_text_it_is_unchanged() {
    // Given: A built document
    let original = sample_document();

    // When: It is written compactly and pretty, then read back
    let compact = from_json(&to_json(&original).expect("compact")).expect("reload compact");
    let pretty = from_json(&to_json_pretty(&original).expect("pretty")).expect("reload pretty");

    // Then: Both copies equal the original
    assert_eq!(compact, original);
    assert_eq!(pretty, original);
}

/// One value and confidence accepted by each built-in namespace.
fn sample_observation(namespace: &str) -> Option<(Value, Value)> {
    let sample = match namespace {
        "beat" => (json!(3), json!(0.9)),
        "beat_position" => (
            json!({ "position": 2, "measure": 14, "num_beats": 4, "beat_units": 4 }),
            json!(null),
        ),
        "blob" => (json!({ "anything": [1, "two", null] }), json!("opaque")),
        "chord" => (json!("A:min7/b3"), json!(0.75)),
        "key_mode" => (json!("Eb:dorian"), json!(null)),
        "lyrics" => (json!("Let it be"), json!(1.0)),
        "mood_thayer" => (json!([-0.25, 0.5]), json!(0.6)),
        "note_hz" => (json!(440.0), json!(null)),
        "note_midi" => (json!(69.5), json!(0.1)),
        "onset" => (json!(null), json!(0.33)),
        "pattern_jku" => (
            json!({ "midi_pitch": 72, "morph_pitch": 67.0, "staff": 1, "pattern_id": 2, "occurrence_id": 1 }),
            json!(null),
        ),
        "pitch_class" => (json!({ "tonic": "F#", "pitch": 4 }), json!(null)),
        "pitch_contour" => (
            json!({ "index": 0, "frequency": 220.125, "voiced": true }),
            json!(0.875),
        ),
        "segment_open" => (json!("bridge"), json!(null)),
        "segment_salami_function" => (json!("pre-chorus"), json!(0.5)),
        "tag_gtzan" => (json!("hip-hop"), json!(0.2)),
        "tag_open" => (json!("live recording"), json!(null)),
        "tempo" => (json!(96.25), json!(0.8)),
        "vector" => (json!([0.1, -2.5, 3e-7]), json!([0.9, 0.8, 0.7])),
        _ => return None,
    };
    Some(sample)
}

#[test]
fn when_any_builtin_namespace_round_trips_observations_are_preserved() {
    // Given: One valid observation for every registered built-in namespace
    let registry = NamespaceRegistry::global();
    let validator = Validator::new(registry);
    let mut jam = Jams::new().with_file_metadata(FileMetadata::new().with_duration(60.0).expect("duration"));

    for namespace in registry.list() {
        let (value, confidence) = sample_observation(&namespace)
            .unwrap_or_else(|| panic!("no sample observation for built-in namespace {namespace}"));
        let observation = Observation::new(1.5, 0.25, value, confidence).expect("observation");
        let schema = registry.lookup(&namespace).expect("registered");
        validator
            .validate_observation(&observation, &schema)
            .unwrap_or_else(|err| panic!("{namespace} sample is invalid: {err}"));

        let mut annotation = Annotation::in_registry(&namespace, registry).expect("annotation");
        annotation.append(observation).expect("append");
        jam.push(annotation);
    }
    jam.validate(&validator).expect("document validates");

    // When: The document is written and read back
    let reloaded = from_json(&to_json(&jam).expect("serializes")).expect("reloads");

    // Then: Every observation keeps its time, duration, value and confidence
    assert_eq!(reloaded.annotations.len(), registry.len());
    for (before, after) in jam.annotations.iter().zip(&reloaded.annotations) {
        assert_eq!(after.namespace(), before.namespace());
        assert_eq!(after.observations(), before.observations(), "{}", before.namespace());
    }
}

#[test]
fn when_floats_round_trip_no_precision_is_lost() {
    let mut jam = Jams::new();
    let mut tempo = Annotation::new("tempo").expect("tempo is built in");
    tempo
        .append(Observation::new(0.1 + 0.2, 1.0 / 3.0, 120.000_000_000_01, 0.95).expect("obs"))
        .expect("append");
    jam.push(tempo);

    let reloaded = from_json(&to_json(&jam).expect("serializes")).expect("reloads");

    let observation = &reloaded.annotations[0].observations()[0];
    assert_eq!(observation.time, 0.1 + 0.2);
    assert_eq!(observation.duration, 1.0 / 3.0);
    assert_eq!(observation.value.as_f64(), Some(120.000_000_000_01));
}

#[test]
fn when_a_document_is_saved_to_disk_it_reads_back() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("sample.jams");
    let original = sample_document();

    to_writer(File::create(&path).expect("create"), &original).expect("write");
    let reloaded = from_reader(File::open(&path).expect("open")).expect("read");

    assert_eq!(reloaded, original);
}
