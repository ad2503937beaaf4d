//! Loader registry.
//!
//! Loaders are registered during session setup, in order, and frozen into a
//! [`ProcessorRegistry`] before any file is processed. Lookup is first match
//! in registration order.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

/// Predicate over an absolute resource path
pub type PathPredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// How a loader decides whether it handles a file.
///
/// Only these three forms are supported. Rule grammars with `include`,
/// `exclude`, `and`/`or` combinators and the like are rejected at
/// registration.
#[derive(Clone)]
pub enum ProcessorTest {
    /// The path starts with this string
    Prefix(String),
    /// The function returns true for the path
    Predicate(PathPredicate),
    /// The regex matches somewhere in the path
    Pattern(Regex),
}

impl ProcessorTest {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    pub fn pattern(pattern: Regex) -> Self {
        Self::Pattern(pattern)
    }

    /// Decode a declarative test: a JSON string is a prefix, an object
    /// `{ "regex": "..." }` is a pattern. Anything else is rejected.
    pub fn from_value(id: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(prefix) => Ok(Self::Prefix(prefix.clone())),
            Value::Object(map) if map.len() == 1 => match map.get("regex") {
                Some(Value::String(source)) => Regex::new(source)
                    .map(Self::Pattern)
                    .map_err(|source| Error::InvalidProcessorPattern {
                        id: id.to_string(),
                        source,
                    }),
                _ => Err(unsupported(id, value)),
            },
            _ => Err(unsupported(id, value)),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Prefix(prefix) => path.to_string_lossy().starts_with(prefix.as_str()),
            Self::Predicate(predicate) => predicate(path),
            Self::Pattern(pattern) => pattern.is_match(&path.to_string_lossy()),
        }
    }
}

impl fmt::Debug for ProcessorTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
        }
    }
}

fn unsupported(id: &str, value: &Value) -> Error {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "rule object",
    };
    Error::UnsupportedProcessorTest {
        id: id.to_string(),
        found: found.to_string(),
    }
}

/// One registered loader
#[derive(Debug, Clone)]
pub struct ProcessorItem {
    pub id: String,
    pub test: ProcessorTest,
    /// Name of the processor implementation to run
    pub loader: String,
    pub options: Value,
}

#[derive(Deserialize)]
struct RawProcessorItem {
    id: String,
    test: Value,
    loader: String,
    #[serde(default)]
    options: Value,
}

impl ProcessorItem {
    pub fn new(id: impl Into<String>, test: ProcessorTest, loader: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            test,
            loader: loader.into(),
            options: Value::Null,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Decode `{ id, test, loader, options? }`.
    ///
    /// Decoding errors name the loader id when one was given.
    pub fn from_value(value: Value) -> Result<Self> {
        let field = match value.get("id").and_then(Value::as_str) {
            Some(id) => format!("loaders.{id}"),
            None => "loaders".to_string(),
        };
        let raw: RawProcessorItem = serde_json::from_value(value).map_err(|e| {
            Error::Config(kiln_config::ConfigError::InvalidValue {
                field,
                hint: Some(e.to_string()),
            })
        })?;
        let test = ProcessorTest::from_value(&raw.id, &raw.test)?;

        Ok(Self {
            id: raw.id,
            test,
            loader: raw.loader,
            options: raw.options,
        })
    }
}

/// Loaders collected during setup, not yet frozen.
#[derive(Debug, Default)]
pub struct ProcessorRegistryBuilder {
    items: Vec<ProcessorItem>,
}

impl ProcessorRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, item: ProcessorItem) -> &mut Self {
        debug!(id = %item.id, loader = %item.loader, test = ?item.test, "registered loader");
        self.items.push(item);
        self
    }

    /// Decode and register a declarative loader.
    ///
    /// On error nothing is registered.
    pub fn register_value(&mut self, value: Value) -> Result<&mut Self> {
        let item = ProcessorItem::from_value(value)?;
        Ok(self.register(item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn freeze(self) -> ProcessorRegistry {
        ProcessorRegistry {
            items: self.items.into(),
        }
    }
}

/// Frozen, ordered loader list. Cheap to clone and share across tasks.
#[derive(Debug, Clone, Default)]
pub struct ProcessorRegistry {
    items: Arc<[ProcessorItem]>,
}

impl ProcessorRegistry {
    /// First loader whose test matches `path`.
    pub fn find(&self, path: &Path) -> Option<&ProcessorItem> {
        self.items.iter().find(|item| item.test.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessorItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefix_test_matches_path_start() {
        let test = ProcessorTest::prefix("/project/src/styles");
        assert!(test.matches(Path::new("/project/src/styles/a.less")));
        assert!(test.matches(Path::new("/project/src/stylesheet.css")));
        assert!(!test.matches(Path::new("/project/lib/a.less")));
    }

    #[test]
    fn predicate_and_pattern_tests() {
        let predicate = ProcessorTest::predicate(|p| p.extension().is_some_and(|e| e == "md"));
        assert!(predicate.matches(Path::new("/a/readme.md")));
        assert!(!predicate.matches(Path::new("/a/readme.txt")));

        let pattern = ProcessorTest::pattern(Regex::new(r"\.(t|j)sx?$").unwrap());
        assert!(pattern.matches(Path::new("/a/index.tsx")));
        assert!(!pattern.matches(Path::new("/a/index.css")));
    }

    #[test]
    fn from_value_accepts_string_and_regex_object() {
        assert!(matches!(
            ProcessorTest::from_value("a", &json!("/src")).unwrap(),
            ProcessorTest::Prefix(p) if p == "/src"
        ));
        assert!(matches!(
            ProcessorTest::from_value("b", &json!({ "regex": "\\.vue$" })).unwrap(),
            ProcessorTest::Pattern(_)
        ));
    }

    #[test]
    fn from_value_rejects_other_shapes() {
        for (value, found) in [
            (json!(42), "number"),
            (json!(["a", "b"]), "array"),
            (json!({ "include": "src", "exclude": "test" }), "rule object"),
            (json!({ "regex": 1 }), "rule object"),
            (json!(null), "null"),
        ] {
            let err = ProcessorTest::from_value("my-loader", &value).unwrap_err();
            let named = matches!(
                &err,
                Error::UnsupportedProcessorTest { id, found: f } if id == "my-loader" && f == found
            );
            assert!(named, "unexpected error for {value}: {err:?}");
        }
    }

    #[test]
    fn invalid_regex_names_loader() {
        let err = ProcessorTest::from_value("broken", &json!({ "regex": "(" })).unwrap_err();
        assert!(matches!(err, Error::InvalidProcessorPattern { id, .. } if id == "broken"));
    }

    #[test]
    fn failed_registration_leaves_registry_unchanged() {
        let mut builder = ProcessorRegistryBuilder::new();
        builder
            .register_value(json!({ "id": "ok", "test": "/src", "loader": "copy" }))
            .unwrap();

        let err = builder
            .register_value(json!({ "id": "bad", "test": true, "loader": "copy" }))
            .unwrap_err();

        assert!(err.to_string().contains("bad"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn find_returns_first_match_in_registration_order() {
        let mut builder = ProcessorRegistryBuilder::new();
        builder
            .register(ProcessorItem::new("first", ProcessorTest::prefix("/src"), "a"))
            .register(ProcessorItem::new("second", ProcessorTest::prefix("/src/x"), "b"));
        let registry = builder.freeze();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find(Path::new("/src/x/y.ts")).unwrap().id, "first");
        assert!(registry.find(Path::new("/lib/y.ts")).is_none());
    }

    #[test]
    fn decode_error_names_loader_id() {
        let err = ProcessorItem::from_value(json!({ "id": "styles", "test": "/src" })).unwrap_err();
        match &err {
            Error::Config(kiln_config::ConfigError::InvalidValue { field, hint }) => {
                assert_eq!(field, "loaders.styles");
                assert!(hint.as_deref().unwrap().contains("loader"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("loaders.styles"));

        let err =
            ProcessorItem::from_value(json!({ "test": "/src", "loader": "copy" })).unwrap_err();
        match err {
            Error::Config(kiln_config::ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "loaders");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn options_are_kept() {
        let item = ProcessorItem::from_value(json!({
            "id": "less",
            "test": { "regex": "\\.less$" },
            "loader": "less",
            "options": { "javascriptEnabled": true }
        }))
        .unwrap();

        assert_eq!(item.options["javascriptEnabled"], true);
    }
}
