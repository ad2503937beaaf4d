use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser environment (default)
    #[default]
    Browser,
    /// Node.js
    Node,
}

/// Bundler used for bundle targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bundler {
    #[default]
    Webpack,
}

/// Built-in bundless transformer names.
pub mod transformer {
    use super::Platform;

    /// General-purpose transformer, used for browser sources.
    pub const BABEL: &str = "babel";

    /// Node-oriented transformer.
    pub const ESBUILD: &str = "esbuild";

    /// Transformer picked when the user did not name one.
    pub fn default_for(platform: Option<Platform>) -> &'static str {
        match platform {
            Some(Platform::Node) => ESBUILD,
            _ => BABEL,
        }
    }
}

/// Options shared by the bundle and bundless sections.
///
/// Every field is optional so that a section can leave a value unset and
/// inherit it from the level above. See [`BaseOptions::merged`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseOptions {
    /// Compile platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Global constants replaced in source code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub define: Option<IndexMap<String, String>>,

    /// Module resolution aliases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcss_options: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoprefixer: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_babel_presets: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_babel_plugins: Option<Vec<Value>>,
}

impl BaseOptions {
    /// Layer `over` on top of `self`.
    ///
    /// Fields set in `over` win; unset fields fall back to `self`. Maps are
    /// replaced as a whole, not merged key by key.
    pub fn merged(&self, over: &BaseOptions) -> BaseOptions {
        BaseOptions {
            platform: over.platform.or(self.platform),
            define: over.define.clone().or_else(|| self.define.clone()),
            alias: over.alias.clone().or_else(|| self.alias.clone()),
            postcss_options: over
                .postcss_options
                .clone()
                .or_else(|| self.postcss_options.clone()),
            autoprefixer: over
                .autoprefixer
                .clone()
                .or_else(|| self.autoprefixer.clone()),
            extra_babel_presets: over
                .extra_babel_presets
                .clone()
                .or_else(|| self.extra_babel_presets.clone()),
            extra_babel_plugins: over
                .extra_babel_plugins
                .clone()
                .or_else(|| self.extra_babel_plugins.clone()),
        }
    }
}

/// Callback that may rewrite the bundler configuration of a bundle target.
///
/// The configuration is passed as JSON and the returned value replaces it.
/// Hooks are only available to programmatic configs; they are never read
/// from or written to config files.
#[derive(Clone)]
pub struct BundlerHook(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl BundlerHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(&self, config: Value) -> Value {
        (self.0)(config)
    }
}

impl fmt::Debug for BundlerHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BundlerHook(..)")
    }
}

impl PartialEq for BundlerHook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
