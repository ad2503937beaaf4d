//! Package metadata (`package.json`) exposed to build targets and loaders.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Every other field, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageJson {
    /// Read `package.json` from `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join("package.json");
        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Read `package.json` from `root`, or an empty package when it is missing.
    pub fn load_or_default(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join("package.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(root)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::invalid("package.json", format!("Invalid JSON: {e}")))
    }

    /// Look up a top-level field that is not `name` or `version`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key).filter(|value| !value.is_null())
    }
}
