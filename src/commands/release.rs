// src/commands/release.rs

//! Release preparation command

use anyhow::{Context, Result, bail};
use std::path::Path;

use super::load_configs;

/// Write checksums, notes and manifest into the artifacts directory
pub fn cmd_release(config_dir: &Path, version: &str, artifacts_dir: &Path) -> Result<()> {
    if !artifacts_dir.is_dir() {
        bail!("Artifacts directory {} does not exist", artifacts_dir.display());
    }
    let configs = load_configs(config_dir)?;

    let manifest = wrtforge::release::prepare_release(version, artifacts_dir, &configs.openwrt)
        .with_context(|| format!("Failed to prepare release {}", version))?;

    println!("Release {} ({})", manifest.tag_name, manifest.name);
    if manifest.prerelease {
        println!("  Marked as prerelease");
    }
    println!("  Assets ({}):", manifest.assets.len());
    for asset in &manifest.assets {
        println!("    {}", asset.display());
    }
    Ok(())
}
