//! Expansion of a [`UserConfig`] into an ordered list of build targets.
//!
//! Bundle targets come first, one per entry. Bundless targets follow as
//! `[base, override_1, override_2, ...]` in override declaration order.
//!
//! Override areas nest by string prefix only (`src/a` and `src/a/b`), so the
//! ignore lists derived here are what keep a file owned by exactly one
//! bundless target:
//!
//! - the base target ignores `k/*` for every override key `k`
//! - the target for `k` ignores `j/*` for every key `j` starting with `k`,
//!   which includes `k` itself and every override nested below it
//!
//! Both sets are computed from the full key set, so the most specific
//! override owns a file whatever order the keys were declared in. Keys and
//! the section input are cleaned first (`./src/node/` becomes `src/node`),
//! the same way file paths are cleaned before matching.

use std::path::PathBuf;

use path_clean::PathClean;
use tracing::debug;

use crate::target::{BuildTargetConfig, BundleConfig, BundleOutput, BundlessConfig};
use crate::user::helpers::{BUNDLE_EXT, DEFAULT_ENTRY, DEFAULT_INPUT, DEFAULT_OUTPUT};
use crate::user::{
    BaseOptions, BundleSection, Bundler, BundlessOverride, BundlessSection, EntrySpec, UserConfig,
    transformer,
};

/// Normalize a user config into concrete build targets.
///
/// Never fails: shape errors are caught when the [`UserConfig`] is
/// deserialized.
///
/// # Example
///
/// ```
/// use kiln_config::{normalize_user_config, UserConfig};
/// use serde_json::json;
///
/// let config = UserConfig::from_value(json!({
///     "esm": { "overrides": { "src/node": { "platform": "node" } } }
/// }))
/// .unwrap();
///
/// let targets = normalize_user_config(&config);
/// let base = targets[0].as_bundless().unwrap();
/// let node = targets[1].as_bundless().unwrap();
///
/// assert_eq!(base.ignores, vec!["src/node/*"]);
/// assert_eq!(base.transformer, "babel");
/// assert_eq!(node.input, "src/node");
/// assert_eq!(node.transformer, "esbuild");
/// ```
pub fn normalize_user_config(user: &UserConfig) -> Vec<BuildTargetConfig> {
    let mut configs = Vec::new();

    if let Some(umd) = &user.umd {
        configs.extend(
            normalize_bundle(user, umd)
                .into_iter()
                .map(BuildTargetConfig::Bundle),
        );
    }

    if let Some(esm) = &user.esm {
        configs.extend(
            normalize_bundless(user, esm)
                .into_iter()
                .map(BuildTargetConfig::Bundless),
        );
    }

    debug!(targets = configs.len(), "normalized user config");
    configs
}

fn normalize_bundle(user: &UserConfig, umd: &BundleSection) -> Vec<BundleConfig> {
    let base = user.base.merged(&umd.base);
    let output_path = umd.output.clone().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let externals = umd.externals.clone().unwrap_or_default();

    match &umd.entry {
        Some(EntrySpec::Multiple(entries)) => entries
            .iter()
            .map(|(name, entry)| BundleConfig {
                bundler: Bundler::Webpack,
                base: base.merged(&entry.base),
                entry: name.clone(),
                output: BundleOutput {
                    filename: format!("{name}.{BUNDLE_EXT}"),
                    path: entry.output.clone().unwrap_or_else(|| output_path.clone()),
                },
                externals: entry.externals.clone().unwrap_or_else(|| externals.clone()),
                chain_webpack: entry
                    .chain_webpack
                    .clone()
                    .or_else(|| umd.chain_webpack.clone()),
            })
            .collect(),
        single => {
            let entry = match single {
                Some(EntrySpec::Single(path)) => path.clone(),
                _ => DEFAULT_ENTRY.to_string(),
            };

            vec![BundleConfig {
                bundler: Bundler::Webpack,
                base,
                entry,
                output: BundleOutput {
                    filename: format!("index.{BUNDLE_EXT}"),
                    path: output_path,
                },
                externals,
                chain_webpack: umd.chain_webpack.clone(),
            }]
        }
    }
}

fn normalize_bundless(user: &UserConfig, esm: &BundlessSection) -> Vec<BundlessConfig> {
    let section_platform = esm.base.platform.or(user.base.platform);
    let section_base = user.base.merged(&esm.base);
    let extra_ignores = esm.ignores.clone().unwrap_or_default();

    let keys: Vec<String> = esm.overrides.keys().map(|key| clean_path(key)).collect();

    let mut configs = Vec::with_capacity(keys.len() + 1);

    let mut base_ignores = area_ignores(&keys);
    base_ignores.extend(extra_ignores.iter().cloned());

    configs.push(BundlessConfig {
        base: section_base.clone(),
        input: clean_path(esm.input.as_deref().unwrap_or(DEFAULT_INPUT)),
        output: esm.output.clone().unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        transformer: esm
            .transformer
            .clone()
            .unwrap_or_else(|| transformer::default_for(section_platform).to_string()),
        ignores: base_ignores,
    });

    for (key, over) in keys.iter().zip(esm.overrides.values()) {
        configs.push(normalize_override(
            key,
            over,
            &keys,
            esm,
            &section_base,
            &extra_ignores,
        ));
    }

    configs
}

fn normalize_override(
    key: &str,
    over: &BundlessOverride,
    keys: &[String],
    esm: &BundlessSection,
    section_base: &BaseOptions,
    extra_ignores: &[String],
) -> BundlessConfig {
    let base = section_base.merged(&over.base);
    let platform = base.platform;

    let mut ignores = area_ignores(keys.iter().filter(|k| k.starts_with(key)));
    ignores.extend(extra_ignores.iter().cloned());
    ignores.extend(over.ignores.iter().flatten().cloned());

    BundlessConfig {
        base,
        input: key.to_string(),
        output: over
            .output
            .clone()
            .or_else(|| esm.output.clone())
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        transformer: over
            .transformer
            .clone()
            .or_else(|| esm.transformer.clone())
            .unwrap_or_else(|| transformer::default_for(platform).to_string()),
        ignores,
    }
}

/// `key/*` for every override key.
fn area_ignores<'a>(keys: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    keys.into_iter().map(|key| format!("{key}/*")).collect()
}

fn clean_path(path: &str) -> String {
    PathBuf::from(path).clean().to_string_lossy().into_owned()
}

/// Split normalized targets by mode, keeping their relative order.
pub fn partition_targets(
    configs: Vec<BuildTargetConfig>,
) -> (Vec<BundleConfig>, Vec<BundlessConfig>) {
    let mut bundle = Vec::new();
    let mut bundless = Vec::new();

    for config in configs {
        match config {
            BuildTargetConfig::Bundle(config) => bundle.push(config),
            BuildTargetConfig::Bundless(config) => bundless.push(config),
        }
    }

    (bundle, bundless)
}
