#![cfg_attr(docsrs, feature(doc_cfg))]

//! # kiln-build
//!
//! Build-time core of Kiln: decides which target governs each source file
//! and which loader processes it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use kiln_build::{FileOutcome, SessionBuilder, create_config_providers};
//! use kiln_config::{PackageJson, UserConfig};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Path::new(".");
//! let user = UserConfig::from_value(json!({
//!     "esm": { "overrides": { "src/node": { "platform": "node" } } }
//! }))?;
//!
//! let providers = create_config_providers(root, &user, PackageJson::load_or_default(root)?)?;
//! let bundless = providers.bundless.as_ref().expect("esm section");
//!
//! // `src/node/a.ts` is governed by the `src/node` override
//! let config = bundless.get_config_for_file("src/node/a.ts").unwrap();
//! assert_eq!(config.transformer, "esbuild");
//!
//! let mut builder = SessionBuilder::new();
//! builder.add_loader_value(json!({
//!     "id": "styles",
//!     "test": { "regex": "\\.less$" },
//!     "loader": "less"
//! }))?;
//! let session = builder.build();
//!
//! match session.process_file(bundless, root, "src/index.ts").await? {
//!     FileOutcome::Processed { output, .. } => println!("{}", output.content),
//!     FileOutcome::PassThrough { .. } => println!("copied"),
//!     FileOutcome::Unmanaged => println!("not part of the bundless build"),
//! }
//! # Ok(()) }
//! ```

use std::path::PathBuf;

use kiln_config::BuildMode;

pub mod loaders;
pub mod matcher;
pub mod provider;
pub mod session;
pub mod transformers;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use loaders::{
    FileDispatcher, LoaderContext, LocalPipeline, OutputMetadata, ProcessRequest, Processor,
    ProcessorItem, ProcessorOutput, ProcessorPipeline, ProcessorRegistry, ProcessorTest,
};
pub use matcher::{InputKind, PathMatcher};
pub use provider::{
    BundleConfigProvider, BundlessConfigProvider, ConfigProviders, create_config_providers,
};
pub use session::{BuildPlugin, BuildSession, FileOutcome, SessionBuilder};
pub use transformers::{TransformInput, Transformer, TransformerRegistry};

/// Error types for kiln-build operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Loader test is not a prefix string, predicate or pattern.
    #[error(
        "Unsupported loader test in `{id}`: got {found}, only string, function and regular expression are available"
    )]
    UnsupportedProcessorTest { id: String, found: String },

    /// Loader pattern is not a valid regular expression.
    #[error("Invalid loader pattern in `{id}`: {source}")]
    InvalidProcessorPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    /// Matched loader names a processor nobody registered.
    #[error("Loader `{id}` uses unknown processor `{loader}`")]
    UnknownProcessor { id: String, loader: String },

    /// Target names a transformer nobody registered.
    #[error("Unknown transformer `{name}`")]
    UnknownTransformer { name: String },

    /// Loader failed on a file. The loader's own message is kept.
    #[error("Loader `{id}` failed on {}: {source}", path.display())]
    Processor {
        id: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Plugin setup failed.
    #[error("Plugin `{name}` failed: {source}")]
    Plugin {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Target input or ignore is not a valid glob.
    #[error("Invalid glob `{pattern}`: {source}")]
    InvalidMatcherPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Target input does not exist.
    #[error("Input not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// A provider was created without targets.
    #[error("No {mode:?} targets to provide")]
    NoTargets { mode: BuildMode },

    /// I/O error with the path involved.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the config crate.
    #[error("Configuration error: {0}")]
    Config(#[from] kiln_config::ConfigError),
}

/// Result type alias for kiln-build operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::UnsupportedProcessorTest { .. } => "UNSUPPORTED_LOADER_TEST",
            Error::InvalidProcessorPattern { .. } => "INVALID_LOADER_PATTERN",
            Error::UnknownProcessor { .. } => "UNKNOWN_PROCESSOR",
            Error::UnknownTransformer { .. } => "UNKNOWN_TRANSFORMER",
            Error::Processor { .. } => "LOADER_FAILED",
            Error::Plugin { .. } => "PLUGIN_FAILED",
            Error::InvalidMatcherPattern { .. } => "INVALID_GLOB",
            Error::MissingInput { .. } => "MISSING_INPUT",
            Error::NoTargets { .. } => "NO_TARGETS",
            Error::Io { .. } => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::UnsupportedProcessorTest { .. } => Some(Box::new(
                "Use a path prefix string, a predicate function or { \"regex\": \"...\" } as the loader test.",
            )),
            Error::UnknownProcessor { loader, .. } => Some(Box::new(format!(
                "Register a processor named '{}' before building the session.",
                loader
            ))),
            Error::UnknownTransformer { name } => Some(Box::new(format!(
                "Transformer '{}' is not registered. Built-in transformers are 'babel' and 'esbuild'.",
                name
            ))),
            Error::MissingInput { path } => Some(Box::new(format!(
                "Create '{}' or point the esm input/overrides at an existing path.",
                path.display()
            ))),
            _ => None,
        }
    }
}
