use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{parse_definitions, NamespaceSchema, BUILTIN_DEFINITIONS};
use crate::JamsError;

/// Catalog mapping namespace names to their schemas.
///
/// Schemas are immutable once registered. Reads take a shared lock; the
/// only write path is [`NamespaceRegistry::register`].
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    schemas: RwLock<BTreeMap<String, Arc<NamespaceSchema>>>,
}

static GLOBAL: OnceLock<Result<NamespaceRegistry, String>> = OnceLock::new();

fn builtins_unavailable(cause: &str) -> JamsError {
    JamsError::parameter(format!("built-in namespaces failed to load: {cause}"))
}

impl NamespaceRegistry {
    /// Empty registry with no namespaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in namespaces.
    pub fn with_builtins() -> Result<Self, JamsError> {
        let registry = Self::new();
        for (file, text) in BUILTIN_DEFINITIONS {
            let count = registry.register_definitions(text)?;
            debug!(file, count, "registered built-in namespaces");
        }
        Ok(registry)
    }

    /// Process-wide registry, seeded with the built-ins on first use.
    ///
    /// Fails on every call if the embedded definitions could not be loaded.
    pub fn try_global() -> Result<&'static NamespaceRegistry, JamsError> {
        GLOBAL
            .get_or_init(|| Self::with_builtins().map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|cause| builtins_unavailable(cause))
    }

    /// Like [`try_global`](Self::try_global), but falls back to an empty
    /// registry when the built-ins failed to load.
    pub fn global() -> &'static NamespaceRegistry {
        static EMPTY: OnceLock<NamespaceRegistry> = OnceLock::new();
        match Self::try_global() {
            Ok(registry) => registry,
            Err(err) => {
                warn!(error = %err, "using an empty namespace registry");
                EMPTY.get_or_init(Self::new)
            }
        }
    }

    /// Register a namespace schema.
    ///
    /// Re-registering identical content is a no-op; a different definition
    /// under an existing name fails with `NamespaceCollision`.
    pub fn register(&self, schema: NamespaceSchema) -> Result<Arc<NamespaceSchema>, JamsError> {
        schema.check()?;

        let mut schemas = self.schemas.write();
        if let Some(existing) = schemas.get(&schema.name) {
            if **existing == schema {
                return Ok(Arc::clone(existing));
            }
            return Err(JamsError::NamespaceCollision { name: schema.name });
        }

        debug!(namespace = %schema.name, "registered namespace");
        let schema = Arc::new(schema);
        schemas.insert(schema.name.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Register every namespace in a JSON definition document.
    ///
    /// Returns the number of namespaces in the document.
    pub fn register_definitions(&self, text: &str) -> Result<usize, JamsError> {
        let schemas = parse_definitions(text)?;
        let count = schemas.len();
        for schema in schemas {
            self.register(schema)?;
        }
        Ok(count)
    }

    /// Register every `*.json` definition file found directly in `dir`.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<usize, JamsError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(JamsError::parameter(format!(
                "schema directory not found: {}",
                dir.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                warn!(path = %path.display(), "skipping non-JSON file in schema directory");
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut total = 0;
        for path in paths {
            let text = fs::read_to_string(&path)?;
            let count = self.register_definitions(&text).map_err(|err| match err {
                JamsError::Parameter { message } => {
                    JamsError::parameter(format!("{}: {message}", path.display()))
                }
                other => other,
            })?;
            debug!(path = %path.display(), count, "loaded namespace definitions");
            total += count;
        }

        Ok(total)
    }

    /// Look up a namespace by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<NamespaceSchema>, JamsError> {
        self.schemas
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| JamsError::namespace_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.read().contains_key(name)
    }

    /// Registered namespace names in sorted order.
    ///
    /// The iterator walks a snapshot taken at call time; call again to restart.
    pub fn list(&self) -> impl Iterator<Item = String> {
        let names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.into_iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
