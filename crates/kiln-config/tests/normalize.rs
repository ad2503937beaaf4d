//! Tests for expanding user configs into build targets.

use kiln_config::{
    BuildMode, BuildTargetConfig, BundleSection, BundlerHook, EntrySpec, Platform, UserConfig,
    normalize_user_config,
};
use serde_json::{Value, json};

fn normalize(value: Value) -> Vec<BuildTargetConfig> {
    normalize_user_config(&UserConfig::from_value(value).unwrap())
}

fn bundless_ignores(targets: &[BuildTargetConfig]) -> Vec<Vec<String>> {
    targets
        .iter()
        .filter_map(BuildTargetConfig::as_bundless)
        .map(|c| c.ignores.clone())
        .collect()
}

#[test]
fn single_entry_bundle_uses_defaults() {
    let targets = normalize(json!({ "umd": {} }));
    assert_eq!(targets.len(), 1);

    let bundle = targets[0].as_bundle().unwrap();
    assert_eq!(bundle.entry, "src/index");
    assert_eq!(bundle.output.filename, "index.umd.js");
    assert_eq!(bundle.output.path, "dist");
    assert!(bundle.externals.is_empty());
}

#[test]
fn single_entry_bundle_respects_section_values() {
    let targets = normalize(json!({
        "define": { "VERSION": "1" },
        "umd": {
            "entry": "src/main",
            "output": "build",
            "platform": "node",
            "externals": { "react": "React" }
        }
    }));

    let bundle = targets[0].as_bundle().unwrap();
    assert_eq!(bundle.entry, "src/main");
    assert_eq!(bundle.output.path, "build");
    assert_eq!(bundle.base.platform, Some(Platform::Node));
    assert_eq!(bundle.base.define.as_ref().unwrap()["VERSION"], "1");
    assert_eq!(bundle.externals["react"], "React");
}

#[test]
fn entry_map_produces_one_bundle_per_entry() {
    let targets = normalize(json!({
        "umd": {
            "output": "umd",
            "externals": { "react": "React" },
            "entry": {
                "src/a": {},
                "src/b": { "output": "umd-b", "platform": "node", "externals": {} }
            }
        }
    }));

    assert_eq!(targets.len(), 2);
    let a = targets[0].as_bundle().unwrap();
    let b = targets[1].as_bundle().unwrap();

    assert_eq!(a.entry, "src/a");
    assert_eq!(a.output.filename, "src/a.umd.js");
    assert_eq!(a.output.path, "umd");
    assert_eq!(a.externals.len(), 1);

    assert_eq!(b.entry, "src/b");
    assert_eq!(b.output.filename, "src/b.umd.js");
    assert_eq!(b.output.path, "umd-b");
    assert_eq!(b.base.platform, Some(Platform::Node));
    assert!(b.externals.is_empty());
}

#[test]
fn bundler_hook_is_carried_to_every_entry() {
    let hook = BundlerHook::new(|value| value);
    let config = UserConfig {
        umd: Some(BundleSection {
            entry: Some(EntrySpec::Multiple(
                [("a".to_string(), Default::default()), ("b".to_string(), Default::default())]
                    .into_iter()
                    .collect(),
            )),
            chain_webpack: Some(hook.clone()),
            ..Default::default()
        }),
        ..Default::default()
    };

    let targets = normalize_user_config(&config);
    for target in &targets {
        assert_eq!(target.as_bundle().unwrap().chain_webpack.as_ref(), Some(&hook));
    }
}

#[test]
fn bundle_targets_precede_bundless_targets() {
    let targets = normalize(json!({ "esm": {}, "umd": {} }));
    let modes: Vec<_> = targets.iter().map(BuildTargetConfig::mode).collect();
    assert_eq!(modes, vec![BuildMode::Bundle, BuildMode::Bundless]);
}

#[test]
fn bundless_base_uses_defaults() {
    let targets = normalize(json!({ "esm": {} }));
    assert_eq!(targets.len(), 1);

    let base = targets[0].as_bundless().unwrap();
    assert_eq!(base.input, "src");
    assert_eq!(base.output, "dist");
    assert_eq!(base.transformer, "babel");
    assert!(base.ignores.is_empty());
}

#[test]
fn node_platform_selects_node_transformer() {
    let targets = normalize(json!({ "platform": "node", "esm": { "input": "lib" } }));

    let base = targets[0].as_bundless().unwrap();
    assert_eq!(base.input, "lib");
    assert_eq!(base.transformer, "esbuild");
}

#[test]
fn node_override_scenario() {
    let targets = normalize(json!({
        "esm": { "overrides": { "src/node": { "platform": "node" } } }
    }));
    assert_eq!(targets.len(), 2);

    let base = targets[0].as_bundless().unwrap();
    assert_eq!(base.input, "src");
    assert_eq!(base.ignores, vec!["src/node/*"]);
    assert_eq!(base.transformer, "babel");
    assert_eq!(base.platform(), None);

    let node = targets[1].as_bundless().unwrap();
    assert_eq!(node.input, "src/node");
    assert_eq!(node.ignores, vec!["src/node/*"]);
    assert_eq!(node.platform(), Some(Platform::Node));
    assert_eq!(node.transformer, "esbuild");
}

#[test]
fn base_ignores_cover_every_override_key() {
    let targets = normalize(json!({
        "esm": { "overrides": { "a": {}, "a/b": {}, "c": {} } }
    }));

    assert_eq!(
        bundless_ignores(&targets),
        vec![
            vec!["a/*", "a/b/*", "c/*"],
            vec!["a/*", "a/b/*"],
            vec!["a/b/*"],
            vec!["c/*"],
        ]
    );
}

#[test]
fn nested_ignores_do_not_depend_on_declaration_order() {
    let targets = normalize(json!({
        "esm": { "overrides": { "a/b": {}, "a": {} } }
    }));

    let inputs: Vec<_> = targets
        .iter()
        .map(|t| t.as_bundless().unwrap().input.as_str())
        .collect();
    assert_eq!(inputs, vec!["src", "a/b", "a"]);

    assert_eq!(
        bundless_ignores(&targets),
        vec![vec!["a/b/*", "a/*"], vec!["a/b/*"], vec!["a/b/*", "a/*"]]
    );
}

#[test]
fn override_inherits_section_fields() {
    let targets = normalize(json!({
        "alias": { "@": "src" },
        "esm": {
            "output": "es",
            "define": { "DEV": "false" },
            "overrides": { "src/server": { "output": "es/server" }, "src/shared": {} }
        }
    }));

    let server = targets[1].as_bundless().unwrap();
    assert_eq!(server.output, "es/server");
    assert_eq!(server.base.alias.as_ref().unwrap()["@"], "src");
    assert_eq!(server.base.define.as_ref().unwrap()["DEV"], "false");

    let shared = targets[2].as_bundless().unwrap();
    assert_eq!(shared.output, "es");
}
