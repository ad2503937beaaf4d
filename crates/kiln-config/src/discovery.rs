//! File-based config discovery
//!
//! Finds the user configuration of a project and loads it into a
//! [`UserConfig`]. Library users with an in-memory config should use
//! [`UserConfig::from_value`] directly.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::package::PackageJson;
use crate::user::UserConfig;

/// Field of `package.json` holding an inline config
pub const PACKAGE_FIELD: &str = "kiln";

/// Prefix of environment variables overriding file values
pub const ENV_PREFIX: &str = "KILN_";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use kiln_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. `kiln.toml`
    /// 2. `kiln.config.json`
    /// 3. `package.json` with a `kiln` field
    pub fn find(&self) -> Option<PathBuf> {
        for name in ["kiln.toml", "kiln.config.json"] {
            let path = self.root.join(name);
            if path.exists() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join("package.json");
        let pkg = std::fs::read_to_string(&pkg_path).ok()?;
        let pkg = PackageJson::parse(&pkg).ok()?;
        pkg.field(PACKAGE_FIELD).map(|_| pkg_path)
    }

    /// Load config from the discovered file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self) -> Result<UserConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        self.load_from(&path)
    }

    /// Load config from a specific file.
    ///
    /// Values from `KILN_*` environment variables are layered on top, with
    /// `__` separating nested keys (`KILN_ESM__INPUT=lib`).
    pub fn load_from(&self, path: &Path) -> Result<UserConfig> {
        debug!(path = %path.display(), "loading config");

        let mut figment = Figment::new().merge(Serialized::defaults(UserConfig::default()));

        figment = match path.extension().and_then(OsStr::to_str) {
            _ if path.file_name() == Some(OsStr::new("package.json")) => {
                let pkg = PackageJson::load(path.parent().unwrap_or(&self.root))?;
                let inline = pkg.field(PACKAGE_FIELD).ok_or_else(|| {
                    ConfigError::invalid(
                        PACKAGE_FIELD,
                        "Add a 'kiln' field to your package.json",
                    )
                })?;
                figment.merge(Serialized::defaults(inline.clone()))
            }
            Some("toml") => figment.merge(Toml::file_exact(path)),
            Some("json") => figment.merge(Json::file_exact(path)),
            _ => {
                return Err(ConfigError::UnsupportedFormat(
                    path.display().to_string(),
                ));
            }
        };

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::invalid("configuration", e))
    }
}

/// Discover and load config from the current directory (convenience function)
pub fn discover() -> Result<UserConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load()
}
