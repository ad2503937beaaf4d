//! Fully resolved build targets produced by normalization.

use indexmap::IndexMap;
use serde::Serialize;

use crate::user::{BaseOptions, Bundler, BundlerHook, Platform};

/// Build mode of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Bundle,
    Bundless,
}

/// One concrete build target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BuildTargetConfig {
    Bundle(BundleConfig),
    Bundless(BundlessConfig),
}

impl BuildTargetConfig {
    pub fn mode(&self) -> BuildMode {
        match self {
            Self::Bundle(_) => BuildMode::Bundle,
            Self::Bundless(_) => BuildMode::Bundless,
        }
    }

    pub fn base(&self) -> &BaseOptions {
        match self {
            Self::Bundle(config) => &config.base,
            Self::Bundless(config) => &config.base,
        }
    }

    pub fn as_bundle(&self) -> Option<&BundleConfig> {
        match self {
            Self::Bundle(config) => Some(config),
            Self::Bundless(_) => None,
        }
    }

    pub fn as_bundless(&self) -> Option<&BundlessConfig> {
        match self {
            Self::Bundless(config) => Some(config),
            Self::Bundle(_) => None,
        }
    }
}

/// Bundle target: `entry` bundled into `output.path/output.filename`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    pub bundler: Bundler,

    #[serde(flatten)]
    pub base: BaseOptions,

    pub entry: String,

    pub output: BundleOutput,

    pub externals: IndexMap<String, String>,

    #[serde(skip)]
    pub chain_webpack: Option<BundlerHook>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleOutput {
    pub filename: String,
    pub path: String,
}

/// Bundless target: every file under `input` not excluded by `ignores`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlessConfig {
    #[serde(flatten)]
    pub base: BaseOptions,

    pub input: String,

    pub output: String,

    pub transformer: String,

    pub ignores: Vec<String>,
}

impl BundlessConfig {
    pub fn platform(&self) -> Option<Platform> {
        self.base.platform
    }
}
