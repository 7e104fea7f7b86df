// src/commands/resolve.rs

//! Package directive resolution command

use anyhow::Result;
use std::path::Path;
use tracing::info;
use wrtforge::render::directive_line;

use super::load_configs;

/// Print the `.config` directive lines for a target
pub fn cmd_resolve(config_dir: &Path, target: &str, subtarget: &str, json: bool) -> Result<()> {
    let configs = load_configs(config_dir)?;
    if configs.openwrt.find_target(target, subtarget).is_none() {
        info!("{}/{} is not declared in openwrt.yml, resolving anyway", target, subtarget);
    }

    let resolution = wrtforge::resolve(
        target,
        subtarget,
        &configs.openwrt.build.base_packages,
        &configs.packages.policy,
        &configs.packages.repositories,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    for directive in &resolution.directives {
        println!("{}", directive_line(directive));
    }
    if !resolution.is_clean() {
        eprintln!("\nRejected package names ({}):", resolution.rejected.len());
        for rejected in &resolution.rejected {
            eprintln!("  {}", rejected);
        }
    }
    Ok(())
}
