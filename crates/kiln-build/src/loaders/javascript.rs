//! Built-in loader for JavaScript and TypeScript sources.
//!
//! Runs the transformer named by the file's target and reports `.js` as the
//! output extension for `.jsx`/`.ts`/`.tsx` sources. TypeScript sources also
//! request a declaration file.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;

use super::pipeline::{ProcessRequest, Processor, ProcessorOutput};
use super::registry::ProcessorTest;
use crate::transformers::{TransformInput, TransformerRegistry};

/// Loader id and processor name of the built-in JavaScript loader
pub const JAVASCRIPT_LOADER: &str = "javascript";

/// Matches `.js`, `.jsx`, `.ts` and `.tsx` files, except declaration files.
pub fn javascript_test() -> ProcessorTest {
    ProcessorTest::predicate(|path| {
        source_kind(path).is_some() && !path.to_string_lossy().ends_with(".d.ts")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Js,
    Jsx,
    Ts,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    match path.extension().and_then(OsStr::to_str)? {
        "js" => Some(SourceKind::Js),
        "jsx" => Some(SourceKind::Jsx),
        "ts" | "tsx" => Some(SourceKind::Ts),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct JavaScriptProcessor {
    transformers: TransformerRegistry,
}

impl JavaScriptProcessor {
    pub fn new(transformers: TransformerRegistry) -> Self {
        Self { transformers }
    }
}

#[async_trait]
impl Processor for JavaScriptProcessor {
    async fn process(
        &self,
        source: String,
        request: &ProcessRequest<'_>,
    ) -> anyhow::Result<Option<ProcessorOutput>> {
        let transformer = self.transformers.for_config(request.context.config)?;
        let code = transformer
            .transform(TransformInput {
                path: request.resource,
                source: &source,
                context: request.context,
            })
            .with_context(|| format!("transformer `{}`", request.context.config.transformer))?;

        let mut output = ProcessorOutput::new(code);
        match source_kind(request.resource) {
            Some(SourceKind::Jsx) => output = output.with_ext(".js"),
            Some(SourceKind::Ts) => output = output.with_ext(".js").with_declaration(true),
            _ => {}
        }

        Ok(Some(output))
    }
}
