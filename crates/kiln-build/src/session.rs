//! Build session: the setup phase that collects loaders and transformers,
//! and the frozen result shared by every file of a build.
//!
//! ```no_run
//! use std::path::Path;
//! use kiln_build::{BuildSession, SessionBuilder};
//! use kiln_config::{ConfigDiscovery, PackageJson};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Path::new(".");
//! let user = ConfigDiscovery::new(root).load()?;
//! let providers = kiln_build::create_config_providers(root, &user, PackageJson::load(root)?)?;
//!
//! let session: BuildSession = SessionBuilder::new().build();
//! if let Some(bundless) = &providers.bundless {
//!     let outcome = session.process_file(bundless, root, "src/index.ts").await?;
//!     println!("{outcome:?}");
//! }
//! # Ok(()) }
//! ```

use std::path::Path;
use std::sync::Arc;

use kiln_config::{BundlessConfig, transformer};
use serde_json::Value;
use tracing::debug;

use crate::loaders::javascript::{JAVASCRIPT_LOADER, javascript_test};
use crate::loaders::{
    FileDispatcher, JavaScriptProcessor, LoaderContext, LocalPipeline, Processor, ProcessorItem,
    ProcessorOutput, ProcessorPipeline, ProcessorRegistry, ProcessorRegistryBuilder,
};
use crate::provider::BundlessConfigProvider;
use crate::transformers::{
    Transformer, TransformerItem, TransformerRegistry, TransformerRegistryBuilder,
};
use crate::{Error, Result};

/// Extension point run during setup.
pub trait BuildPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Register loaders, processors and transformers.
    fn setup(&self, builder: &mut SessionBuilder) -> Result<()>;
}

/// Mutable setup phase of a [`BuildSession`].
#[derive(Debug, Default)]
pub struct SessionBuilder {
    loaders: ProcessorRegistryBuilder,
    transformers: TransformerRegistryBuilder,
    processors: LocalPipeline,
    javascript: bool,
}

impl SessionBuilder {
    /// A builder with no loaders and no transformers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder seeded with the built-in transformer pair and the
    /// JavaScript loader that uses them.
    pub fn with_builtin_transformers(
        babel: Arc<dyn Transformer>,
        esbuild: Arc<dyn Transformer>,
    ) -> Self {
        let mut builder = Self::new();
        builder
            .add_transformer(transformer::BABEL, babel)
            .add_transformer(transformer::ESBUILD, esbuild)
            .add_loader(ProcessorItem::new(
                JAVASCRIPT_LOADER,
                javascript_test(),
                JAVASCRIPT_LOADER,
            ));
        builder.javascript = true;
        builder
    }

    pub fn add_loader(&mut self, item: ProcessorItem) -> &mut Self {
        self.loaders.register(item);
        self
    }

    /// Register a declarative loader (`{ id, test, loader, options? }`).
    ///
    /// Fails without registering anything if the test is not a string or a
    /// `{ "regex": ... }` object.
    pub fn add_loader_value(&mut self, value: Value) -> Result<&mut Self> {
        self.loaders.register_value(value)?;
        Ok(self)
    }

    /// Provide the implementation run for loaders naming `name`.
    pub fn add_processor(
        &mut self,
        name: impl Into<String>,
        processor: Arc<dyn Processor>,
    ) -> &mut Self {
        self.processors.insert(name, processor);
        self
    }

    pub fn add_transformer(
        &mut self,
        id: impl Into<String>,
        transformer: Arc<dyn Transformer>,
    ) -> &mut Self {
        self.transformers.add(TransformerItem::new(id, transformer));
        self
    }

    /// Run a plugin's setup hook. Errors name the plugin.
    pub fn plugin(&mut self, plugin: &dyn BuildPlugin) -> Result<&mut Self> {
        debug!(plugin = plugin.name(), "applying plugin");
        plugin.setup(self).map_err(|source| Error::Plugin {
            name: plugin.name().to_string(),
            source: Box::new(source),
        })?;
        Ok(self)
    }

    pub fn loader_count(&self) -> usize {
        self.loaders.len()
    }

    /// Freeze everything registered so far, running loaders in-process.
    pub fn build(mut self) -> BuildSession {
        let transformers = self.transformers.freeze();
        if self.javascript && !self.processors.contains(JAVASCRIPT_LOADER) {
            self.processors.insert(
                JAVASCRIPT_LOADER,
                Arc::new(JavaScriptProcessor::new(transformers.clone())),
            );
        }

        let pipeline: Arc<dyn ProcessorPipeline> = Arc::new(self.processors);
        Self::assemble(self.loaders.freeze(), transformers, pipeline)
    }

    /// Freeze everything registered so far, running loaders through an
    /// external pipeline. Processors added to this builder are not used.
    pub fn build_with_pipeline(self, pipeline: Arc<dyn ProcessorPipeline>) -> BuildSession {
        Self::assemble(self.loaders.freeze(), self.transformers.freeze(), pipeline)
    }

    fn assemble(
        loaders: ProcessorRegistry,
        transformers: TransformerRegistry,
        pipeline: Arc<dyn ProcessorPipeline>,
    ) -> BuildSession {
        debug!(
            loaders = loaders.len(),
            transformers = transformers.len(),
            "build session ready"
        );
        BuildSession {
            dispatcher: FileDispatcher::new(loaders, pipeline),
            transformers,
        }
    }
}

/// What happened to one file of a bundless build.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome<'a> {
    /// No bundless target manages the file
    Unmanaged,
    /// Managed, but no loader handled it; copy it as is
    PassThrough { config: &'a BundlessConfig },
    /// A loader produced output
    Processed {
        config: &'a BundlessConfig,
        output: ProcessorOutput,
    },
}

/// Frozen loaders and transformers of one build. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BuildSession {
    dispatcher: FileDispatcher,
    transformers: TransformerRegistry,
}

impl BuildSession {
    pub fn loaders(&self) -> &ProcessorRegistry {
        self.dispatcher.registry()
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    pub fn dispatcher(&self) -> &FileDispatcher {
        &self.dispatcher
    }

    /// Route `path` (relative to `root`) to its target and run its loader.
    pub async fn process_file<'a>(
        &self,
        provider: &'a BundlessConfigProvider,
        root: &Path,
        path: impl AsRef<Path>,
    ) -> Result<FileOutcome<'a>> {
        let path = path.as_ref();
        let Some(config) = provider.get_config_for_file(path) else {
            return Ok(FileOutcome::Unmanaged);
        };

        let absolute = root.join(path);
        let context = LoaderContext {
            config,
            pkg: provider.pkg(),
        };

        Ok(match self.dispatcher.dispatch(&absolute, context).await? {
            Some(output) => FileOutcome::Processed { config, output },
            None => FileOutcome::PassThrough { config },
        })
    }
}
