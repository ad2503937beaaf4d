//! Declarative user configuration.
//!
//! This is the shape users write in `kiln.toml`, `kiln.config.json` or the
//! `kiln` field of `package.json`. It is expanded into concrete build targets
//! by [`normalize_user_config`](crate::normalize_user_config).

pub(crate) mod helpers;
mod types;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};

pub use types::{BaseOptions, Bundler, BundlerHook, Platform, transformer};

/// Top-level user configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Options inherited by every section
    #[serde(flatten)]
    pub base: BaseOptions,

    /// Bundle (umd) section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub umd: Option<BundleSection>,

    /// Bundless (esm) section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esm: Option<BundlessSection>,
}

impl UserConfig {
    /// Create from serde_json::Value (for programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_config::{Platform, UserConfig};
    /// use serde_json::json;
    ///
    /// let config = UserConfig::from_value(json!({
    ///     "platform": "node",
    ///     "esm": { "input": "lib" }
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(config.base.platform, Some(Platform::Node));
    /// assert_eq!(config.esm.unwrap().input.as_deref(), Some("lib"));
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::invalid("config", e))
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::invalid("config", e))
    }
}

/// Bundle section: one aggregated output per entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSection {
    #[serde(flatten)]
    pub base: BaseOptions,

    /// Single entry path, or per-entry overrides keyed by entry path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntrySpec>,

    /// Output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Dependencies left out of the bundle, mapped to their global name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub externals: Option<IndexMap<String, String>>,

    #[serde(skip)]
    pub chain_webpack: Option<BundlerHook>,
}

/// Bundle entry declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Single(String),
    Multiple(IndexMap<String, EntryOverride>),
}

/// Per-entry overrides of the bundle section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryOverride {
    #[serde(flatten)]
    pub base: BaseOptions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub externals: Option<IndexMap<String, String>>,

    #[serde(skip)]
    pub chain_webpack: Option<BundlerHook>,
}

/// Bundless section: file-to-file transform of a source tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlessSection {
    #[serde(flatten)]
    pub base: BaseOptions,

    /// Source directory, `src` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Output directory, `dist` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Transformer name; picked from the platform when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<String>,

    /// Per-directory (or per-file) overrides keyed by path prefix
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub overrides: IndexMap<String, BundlessOverride>,

    /// Extra ignore globs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores: Option<Vec<String>>,
}

/// Overrides for one path prefix of the bundless section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlessOverride {
    #[serde(flatten)]
    pub base: BaseOptions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores: Option<Vec<String>>,
}
