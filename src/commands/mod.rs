// src/commands/mod.rs
//! Command handlers for the wrtforge CLI

mod build;
mod feeds;
mod release;
mod resolve;
mod snapshot;
mod version;

pub use build::{BuildArgs, cmd_build};
pub use feeds::cmd_feeds;
pub use release::cmd_release;
pub use resolve::cmd_resolve;
pub use snapshot::cmd_snapshot;
pub use version::{cmd_version, firmware_version};

use anyhow::{Context, Result};
use std::path::Path;
use wrtforge::ConfigSet;

/// Load both configuration files, naming the directory on failure
fn load_configs(config_dir: &Path) -> Result<ConfigSet> {
    ConfigSet::load(config_dir)
        .with_context(|| format!("Failed to load configuration from {}", config_dir.display()))
}
