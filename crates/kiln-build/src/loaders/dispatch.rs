use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::pipeline::{LoaderContext, ProcessRequest, ProcessorOutput, ProcessorPipeline};
use super::registry::ProcessorRegistry;
use crate::Result;

/// Routes a file to the first matching loader and runs it.
///
/// Holds only frozen state, so one dispatcher can serve any number of
/// concurrent files.
#[derive(Clone)]
pub struct FileDispatcher {
    registry: ProcessorRegistry,
    pipeline: Arc<dyn ProcessorPipeline>,
}

impl FileDispatcher {
    pub fn new(registry: ProcessorRegistry, pipeline: Arc<dyn ProcessorPipeline>) -> Self {
        Self { registry, pipeline }
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Process the file at absolute path `path`.
    ///
    /// Returns `Ok(None)` when no loader matches or the loader produced
    /// nothing; the file should then be passed through untouched. Pipeline
    /// errors are returned as is.
    pub async fn dispatch(
        &self,
        path: &Path,
        context: LoaderContext<'_>,
    ) -> Result<Option<ProcessorOutput>> {
        let Some(item) = self.registry.find(path) else {
            debug!(path = %path.display(), "no loader matched");
            return Ok(None);
        };

        debug!(path = %path.display(), loader = %item.id, "dispatching to loader");

        self.pipeline
            .run(ProcessRequest {
                resource: path,
                loader_id: &item.id,
                loader: &item.loader,
                options: &item.options,
                context,
            })
            .await
    }
}

impl std::fmt::Debug for FileDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
