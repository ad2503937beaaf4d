//! Config providers: the normalized targets of one build mode.
//!
//! A [`BundlessConfigProvider`] answers "which target governs this file?".
//! Matchers are tried in target order (`[base, overrides...]`) and the first
//! match wins. Normalization derives ignore lists so that a file inside an
//! override area is only matched by the most specific override.

use std::path::Path;
use std::sync::Arc;

use kiln_config::{
    BuildMode, BundleConfig, BundlessConfig, PackageJson, UserConfig, normalize_user_config,
    partition_targets,
};
use tracing::debug;

use crate::matcher::{InputKind, PathMatcher, clean};
use crate::{Error, Result};

/// Bundle targets. Each is driven by its own entry, so there is no per-file
/// routing.
#[derive(Debug, Clone)]
pub struct BundleConfigProvider {
    configs: Vec<BundleConfig>,
    pkg: Arc<PackageJson>,
}

impl BundleConfigProvider {
    pub fn new(configs: Vec<BundleConfig>, pkg: Arc<PackageJson>) -> Self {
        Self { configs, pkg }
    }

    pub fn mode(&self) -> BuildMode {
        BuildMode::Bundle
    }

    pub fn configs(&self) -> &[BundleConfig] {
        &self.configs
    }

    pub fn pkg(&self) -> &PackageJson {
        &self.pkg
    }
}

/// Bundless targets with one matcher per target, index-aligned.
#[derive(Debug, Clone)]
pub struct BundlessConfigProvider {
    configs: Vec<BundlessConfig>,
    matchers: Vec<PathMatcher>,
    pkg: Arc<PackageJson>,
}

impl BundlessConfigProvider {
    /// Build matchers for `configs`, resolving inputs against `root` to tell
    /// directories from files.
    pub fn new(root: &Path, configs: Vec<BundlessConfig>, pkg: Arc<PackageJson>) -> Result<Self> {
        Self::with_input_kinds(configs, pkg, |input| {
            InputKind::detect(&root.join(input))
        })
    }

    /// Build matchers with a custom input classifier.
    ///
    /// The first config is the base target; the rest are overrides.
    pub fn with_input_kinds<F>(
        configs: Vec<BundlessConfig>,
        pkg: Arc<PackageJson>,
        mut kind_of: F,
    ) -> Result<Self>
    where
        F: FnMut(&str) -> Result<InputKind>,
    {
        if configs.is_empty() {
            return Err(Error::NoTargets {
                mode: BuildMode::Bundless,
            });
        }

        let mut matchers = Vec::with_capacity(configs.len());
        for (index, config) in configs.iter().enumerate() {
            let kind = kind_of(&config.input)?;
            let matcher = if index == 0 {
                PathMatcher::with_kind(&config.input, kind, &config.ignores)?
            } else {
                let ignores: Vec<String> = config
                    .ignores
                    .iter()
                    .filter(|ignore| !is_own_area(&config.input, ignore))
                    .cloned()
                    .collect();
                PathMatcher::with_kind(&config.input, kind, &ignores)?
            };

            debug!(
                index,
                input = %config.input,
                pattern = matcher.pattern(),
                ignores = ?matcher.ignore_patterns().collect::<Vec<_>>(),
                "bundless target"
            );
            matchers.push(matcher);
        }

        Ok(Self {
            configs,
            matchers,
            pkg,
        })
    }

    pub fn mode(&self) -> BuildMode {
        BuildMode::Bundless
    }

    pub fn configs(&self) -> &[BundlessConfig] {
        &self.configs
    }

    pub fn pkg(&self) -> &PackageJson {
        &self.pkg
    }

    /// Input directory of the base target
    pub fn input(&self) -> &str {
        &self.configs[0].input
    }

    /// Output directory of the base target
    pub fn output(&self) -> &str {
        &self.configs[0].output
    }

    /// Index of the target governing `path`, relative to the project root.
    pub fn index_for_file(&self, path: impl AsRef<Path>) -> Option<usize> {
        let path = path.as_ref();
        let index = self.matchers.iter().position(|m| m.is_match(path));
        debug!(path = %path.display(), index, "routed file");
        index
    }

    /// Target governing `path`, relative to the project root.
    ///
    /// `None` means no bundless target manages the file.
    pub fn get_config_for_file(&self, path: impl AsRef<Path>) -> Option<&BundlessConfig> {
        self.index_for_file(path).map(|index| &self.configs[index])
    }
}

/// Whether `ignore` is an override's derived ignore of its own area
/// (`input/*` or `input/**`). Registered as is, it would exclude every file
/// the override is meant to own.
fn is_own_area(input: &str, ignore: &str) -> bool {
    let input = clean(input);
    ignore
        .strip_suffix("/**")
        .or_else(|| ignore.strip_suffix("/*"))
        .is_some_and(|area| clean(area) == input)
}

/// Providers for every build mode present in a user config.
#[derive(Debug, Clone, Default)]
pub struct ConfigProviders {
    pub bundle: Option<BundleConfigProvider>,
    pub bundless: Option<BundlessConfigProvider>,
}

/// Normalize `user` and wrap the targets of each mode in a provider.
///
/// A provider is only created for a mode that has at least one target.
pub fn create_config_providers(
    root: &Path,
    user: &UserConfig,
    pkg: PackageJson,
) -> Result<ConfigProviders> {
    let pkg = Arc::new(pkg);
    let (bundle, bundless) = partition_targets(normalize_user_config(user));

    let mut providers = ConfigProviders::default();

    if !bundle.is_empty() {
        providers.bundle = Some(BundleConfigProvider::new(bundle, Arc::clone(&pkg)));
    }

    if !bundless.is_empty() {
        providers.bundless = Some(BundlessConfigProvider::new(root, bundless, pkg)?);
    }

    Ok(providers)
}
