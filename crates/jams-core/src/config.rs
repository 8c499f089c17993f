use std::env;
use std::path::PathBuf;

use crate::model::Annotation;
use crate::namespace::NamespaceRegistry;
use crate::validation::{ValidationMode, Validator};
use crate::JamsError;

/// Runtime options for loading namespaces and validating documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JamsConfig {
    pub validation_mode: ValidationMode,
    /// Validate observations on `append` for annotations built via
    /// [`JamsConfig::annotation`].
    pub strict: bool,
    /// Directory of extra namespace definition files.
    pub schema_dir: Option<PathBuf>,
}

impl JamsConfig {
    pub const SCHEMA_DIR_ENV: &'static str = "JAMS_SCHEMA_DIR";
    pub const STRICT_ENV: &'static str = "JAMS_STRICT";
    pub const VALIDATION_ENV: &'static str = "JAMS_VALIDATION";

    /// Read `JAMS_SCHEMA_DIR`, `JAMS_STRICT` and `JAMS_VALIDATION`, falling
    /// back to defaults for unset variables.
    pub fn from_env() -> Result<Self, JamsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, JamsError> {
        let mut config = Self::default();

        if let Some(dir) = lookup(Self::SCHEMA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            config.schema_dir = Some(PathBuf::from(dir.trim()));
        }

        if let Some(strict) = lookup(Self::STRICT_ENV) {
            config.strict = parse_flag(Self::STRICT_ENV, &strict)?;
        }

        if let Some(mode) = lookup(Self::VALIDATION_ENV) {
            config.validation_mode = mode.parse()?;
        }

        Ok(config)
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// Register the definitions in `schema_dir`, if set.
    pub fn load_schemas(&self, registry: &NamespaceRegistry) -> Result<usize, JamsError> {
        match &self.schema_dir {
            Some(dir) => registry.load_dir(dir),
            None => Ok(0),
        }
    }

    pub fn validator<'r>(&self, registry: &'r NamespaceRegistry) -> Validator<'r> {
        Validator::new(registry).with_mode(self.validation_mode)
    }

    /// New annotation in `registry` honoring the configured strictness.
    pub fn annotation(
        &self,
        namespace: &str,
        registry: &NamespaceRegistry,
    ) -> Result<Annotation, JamsError> {
        Ok(Annotation::in_registry(namespace, registry)?.strict(self.strict))
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, JamsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(JamsError::parameter(format!(
            "{name} must be a boolean flag, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = JamsConfig::from_lookup(lookup_from(&[])).expect("defaults");
        assert_eq!(config, JamsConfig::default());
        assert_eq!(config.validation_mode, ValidationMode::FailFast);
    }

    #[test]
    fn reads_every_variable() {
        let config = JamsConfig::from_lookup(lookup_from(&[
            ("JAMS_SCHEMA_DIR", "/opt/jams/schemas"),
            ("JAMS_STRICT", "yes"),
            ("JAMS_VALIDATION", "accumulate"),
        ]))
        .expect("parses");

        assert_eq!(config.schema_dir, Some(PathBuf::from("/opt/jams/schemas")));
        assert!(config.strict);
        assert_eq!(config.validation_mode, ValidationMode::Accumulate);
    }

    #[test]
    fn rejects_malformed_flag() {
        let err = JamsConfig::from_lookup(lookup_from(&[("JAMS_STRICT", "maybe")]))
            .expect_err("must fail");
        assert!(err.to_string().contains("JAMS_STRICT"));
    }

    #[test]
    fn strict_config_builds_strict_annotations() {
        let registry = NamespaceRegistry::with_builtins().expect("built-ins");
        let annotation = JamsConfig::default()
            .with_strict(true)
            .annotation("beat", &registry)
            .expect("beat");
        assert!(annotation.is_strict());
    }

    #[test]
    fn no_schema_dir_loads_nothing() {
        let registry = NamespaceRegistry::new();
        assert_eq!(JamsConfig::default().load_schemas(&registry).expect("noop"), 0);
        assert!(registry.is_empty());
    }
}
