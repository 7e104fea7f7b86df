// tests/resolution.rs

//! Directive resolution against configuration loaded from disk.

mod common;

use wrtforge::render::directive_lines;
use wrtforge::{ConfigSet, DirectiveSource, Error, PackagePolicy, resolve};

#[test]
fn test_resolve_from_config_dir() {
    let dir = common::config_dir();
    let configs = ConfigSet::load(dir.path()).unwrap();

    let res = resolve(
        "x86",
        "64",
        &configs.openwrt.build.base_packages,
        &configs.packages.policy,
        &configs.packages.repositories,
    )
    .unwrap();

    assert_eq!(
        res.directives.pairs(),
        [
            ("luci", true),
            ("curl", false),
            ("htop", true),
            ("wireguard", true),
            ("custom-agent", true),
            ("ssh-tool", true),
        ]
    );
    assert_eq!(res.directives.get("parked-pkg"), None);
    assert_eq!(res.rejected.len(), 1);
    assert_eq!(res.rejected[0].name, "bad name");
    assert_eq!(res.rejected[0].source, DirectiveSource::Repository("custom".to_string()));
}

#[test]
fn test_other_target_only_gets_global_policy() {
    let dir = common::config_dir();
    let configs = ConfigSet::load(dir.path()).unwrap();

    let res = resolve(
        "ramips",
        "mt7621",
        &configs.openwrt.build.base_packages,
        &configs.packages.policy,
        &[],
    )
    .unwrap();
    assert_eq!(res.directives.pairs(), [("luci", true), ("curl", false), ("htop", true)]);
}

#[test]
fn test_rendered_lines_match_reference() {
    let policy = PackagePolicy::new()
        .with_include("all", ["htop"])
        .with_include("x86_64", ["wireguard"])
        .with_exclude("all", ["curl"]);
    let base = vec!["luci".to_string(), "curl".to_string()];

    let res = resolve("x86", "64", &base, &policy, &[]).unwrap();
    assert_eq!(
        directive_lines(&res.directives),
        [
            "CONFIG_PACKAGE_luci=y",
            "# CONFIG_PACKAGE_curl is not set",
            "CONFIG_PACKAGE_htop=y",
            "CONFIG_PACKAGE_wireguard=y",
        ]
    );
}

#[test]
fn test_every_name_appears_once() {
    let policy = PackagePolicy::new()
        .with_include("all", ["a", "b", "a"])
        .with_include("x86_64", ["b", "c"])
        .with_exclude("all", ["c", "d"])
        .with_exclude("x86_64", ["d", "a"]);
    let base = vec!["a".to_string(), "e".to_string()];

    let res = resolve("x86", "64", &base, &policy, &[]).unwrap();
    let mut names: Vec<&str> = res.directives.iter().map(|d| d.name.as_str()).collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);

    for excluded in ["a", "c", "d"] {
        assert_eq!(res.directives.is_enabled(excluded), Some(false), "{}", excluded);
    }
}

#[test]
fn test_blank_scope_in_config_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    common::write_config(
        dir.path(),
        common::OPENWRT_YML,
        "include_packages:\n  \"\": [htop]\n",
    );
    assert!(matches!(ConfigSet::load(dir.path()), Err(Error::Configuration(_))));
}
