// tests/common/mod.rs

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const OPENWRT_YML: &str = r#"
default_version: "23.05.3"
targets:
  - name: x86
    subtarget: 64
    description: Generic x86_64
  - name: ramips
    subtarget: mt7621
    description: MediaTek MT7621
build:
  jobs: 2
  base_packages: [luci, curl]
  kernel_config:
    - CONFIG_KERNEL_BPF_EVENTS=y
"#;

pub const PACKAGES_YML: &str = r#"
include_packages:
  all: [htop]
  x86_64: [wireguard]
exclude_packages:
  all: [curl]
repositories:
  - name: custom
    url: https://github.com/org/private-feed
    branch: openwrt-23.05
    auth_token: ghp_topsecret
    packages: [custom-agent, "bad name"]
  - name: keys
    url: git@github.com:org/ssh-feed.git
    packages: [ssh-tool]
  - name: parked
    url: https://github.com/org/parked
    enabled: false
    packages: [parked-pkg]
"#;

/// Token used in [`PACKAGES_YML`]
pub const SECRET: &str = "ghp_topsecret";

/// Create a configuration directory with `openwrt.yml` and `packages.yml`.
///
/// Keep the TempDir alive to prevent cleanup.
pub fn config_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), OPENWRT_YML, PACKAGES_YML);
    dir
}

pub fn write_config(dir: &Path, openwrt: &str, packages: &str) {
    fs::write(dir.join("openwrt.yml"), openwrt).unwrap();
    fs::write(dir.join("packages.yml"), packages).unwrap();
}

/// Minimal OpenWrt checkout layout: `feeds.conf.default` and `scripts/`.
pub fn openwrt_checkout() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("scripts")).unwrap();
    fs::write(
        dir.path().join("feeds.conf.default"),
        "src-git packages https://git.openwrt.org/feed/packages.git^063b2393\n",
    )
    .unwrap();
    dir
}
