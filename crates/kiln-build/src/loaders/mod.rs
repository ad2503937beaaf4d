//! Loaders: per-file content processors selected by a match test.
//!
//! - [`registry`]: ordered loader list, frozen after setup
//! - [`pipeline`]: how a matched loader is run
//! - [`FileDispatcher`]: first-match routing of a file to a loader

mod dispatch;
pub mod javascript;
pub mod pipeline;
pub mod registry;

pub use dispatch::FileDispatcher;
pub use javascript::JavaScriptProcessor;
pub use pipeline::{
    LoaderContext, LocalPipeline, OutputMetadata, ProcessRequest, Processor, ProcessorOutput,
    ProcessorPipeline,
};
pub use registry::{
    PathPredicate, ProcessorItem, ProcessorRegistry, ProcessorRegistryBuilder, ProcessorTest,
};
