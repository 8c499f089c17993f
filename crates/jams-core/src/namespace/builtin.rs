//! Namespace definitions compiled into the crate.

/// `(file name, definition document)` pairs registered by
/// [`NamespaceRegistry::with_builtins`](super::NamespaceRegistry::with_builtins).
pub const BUILTIN_DEFINITIONS: &[(&str, &str)] = &[
    ("beat.json", include_str!("../../schemas/namespaces/beat.json")),
    ("chord.json", include_str!("../../schemas/namespaces/chord.json")),
    ("segment.json", include_str!("../../schemas/namespaces/segment.json")),
    ("tag.json", include_str!("../../schemas/namespaces/tag.json")),
    ("onset.json", include_str!("../../schemas/namespaces/onset.json")),
    ("tempo.json", include_str!("../../schemas/namespaces/tempo.json")),
    ("pitch.json", include_str!("../../schemas/namespaces/pitch.json")),
    ("pattern.json", include_str!("../../schemas/namespaces/pattern.json")),
    ("misc.json", include_str!("../../schemas/namespaces/misc.json")),
];
