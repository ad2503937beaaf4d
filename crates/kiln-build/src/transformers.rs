//! Bundless JavaScript transformers.
//!
//! The registry starts with the built-in pair supplied by the host (see
//! [`kiln_config::transformer`]), plugins append to it during setup, and it
//! is frozen with the rest of the session. Lookup is by name; when a name is
//! registered twice the first registration wins.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kiln_config::BundlessConfig;
use tracing::debug;

use crate::loaders::LoaderContext;
use crate::{Error, Result};

/// Source of one file handed to a transformer.
#[derive(Debug, Clone, Copy)]
pub struct TransformInput<'a> {
    pub path: &'a Path,
    pub source: &'a str,
    pub context: LoaderContext<'a>,
}

/// Converts one file's source to output code.
pub trait Transformer: Send + Sync {
    fn transform(&self, input: TransformInput<'_>) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct TransformerItem {
    pub id: String,
    pub transformer: Arc<dyn Transformer>,
}

impl TransformerItem {
    pub fn new(id: impl Into<String>, transformer: Arc<dyn Transformer>) -> Self {
        Self {
            id: id.into(),
            transformer,
        }
    }
}

impl fmt::Debug for TransformerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerItem")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct TransformerRegistryBuilder {
    items: Vec<TransformerItem>,
}

impl TransformerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: TransformerItem) -> &mut Self {
        debug!(id = %item.id, "registered transformer");
        self.items.push(item);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn freeze(self) -> TransformerRegistry {
        TransformerRegistry {
            items: self.items.into(),
        }
    }
}

/// Frozen transformer list
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    items: Arc<[TransformerItem]>,
}

impl TransformerRegistry {
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Transformer>> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| &item.transformer)
    }

    /// Transformer named by a bundless target.
    pub fn for_config(&self, config: &BundlessConfig) -> Result<&Arc<dyn Transformer>> {
        self.get(&config.transformer)
            .ok_or_else(|| Error::UnknownTransformer {
                name: config.transformer.clone(),
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
