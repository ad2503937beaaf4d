//! Processing pipeline invoked for a matched loader.
//!
//! A loader reports its transformed content together with optional output
//! metadata in one [`ProcessorOutput`].

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use kiln_config::{BundlessConfig, PackageJson};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Extra facts a loader reports about its output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Output file extension replacing the source one (e.g. `.js`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    /// Emit a companion declaration file for this output
    #[serde(default)]
    pub declaration: bool,
}

/// Transformed content of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorOutput {
    pub content: String,
    pub metadata: OutputMetadata,
}

impl ProcessorOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: OutputMetadata::default(),
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.metadata.ext = Some(ext.into());
        self
    }

    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.metadata.declaration = declaration;
        self
    }
}

/// What a loader can see of the build.
#[derive(Debug, Clone, Copy)]
pub struct LoaderContext<'a> {
    /// Target config governing the file
    pub config: &'a BundlessConfig,
    pub pkg: &'a PackageJson,
}

/// One loader invocation.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRequest<'a> {
    /// Absolute path of the file
    pub resource: &'a Path,
    pub loader_id: &'a str,
    pub loader: &'a str,
    pub options: &'a Value,
    pub context: LoaderContext<'a>,
}

/// Runs one loader over one file.
///
/// `Ok(None)` means the loader produced nothing for the file.
#[async_trait]
pub trait ProcessorPipeline: Send + Sync {
    async fn run(&self, request: ProcessRequest<'_>) -> Result<Option<ProcessorOutput>>;
}

/// A loader implementation.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(
        &self,
        source: String,
        request: &ProcessRequest<'_>,
    ) -> anyhow::Result<Option<ProcessorOutput>>;
}

/// In-process pipeline: reads the file and hands it to the processor
/// registered under the loader name.
#[derive(Clone, Default)]
pub struct LocalPipeline {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl LocalPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processor(
        mut self,
        name: impl Into<String>,
        processor: Arc<dyn Processor>,
    ) -> Self {
        self.insert(name, processor);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.insert(name.into(), processor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }
}

impl fmt::Debug for LocalPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.processors.keys().collect();
        names.sort();
        f.debug_struct("LocalPipeline")
            .field("processors", &names)
            .finish()
    }
}

#[async_trait]
impl ProcessorPipeline for LocalPipeline {
    async fn run(&self, request: ProcessRequest<'_>) -> Result<Option<ProcessorOutput>> {
        let processor = self
            .processors
            .get(request.loader)
            .ok_or_else(|| Error::UnknownProcessor {
                id: request.loader_id.to_string(),
                loader: request.loader.to_string(),
            })?;

        let source = tokio::fs::read_to_string(request.resource)
            .await
            .map_err(|source| Error::Io {
                path: request.resource.to_path_buf(),
                source,
            })?;

        processor
            .process(source, &request)
            .await
            .map_err(|source| Error::Processor {
                id: request.loader_id.to_string(),
                path: request.resource.to_path_buf(),
                source,
            })
    }
}
