// src/commands/feeds.rs

//! Feed registration command

use anyhow::Result;
use std::path::Path;

use super::load_configs;

/// Print feed lines with credentials masked
pub fn cmd_feeds(config_dir: &Path) -> Result<()> {
    let configs = load_configs(config_dir)?;
    let feeds = wrtforge::register_feeds(&configs.packages.repositories);

    if feeds.is_empty() {
        println!("No enabled repositories.");
        return Ok(());
    }
    print!("{}", wrtforge::render::render_feeds_redacted(&feeds));
    Ok(())
}
