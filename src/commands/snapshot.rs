// src/commands/snapshot.rs

//! Redacted configuration snapshot command

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use wrtforge::{BuildPlan, BuildRequest, BuildSnapshot};

use super::load_configs;

/// Print what a build of the target would be configured with, as JSON
pub fn cmd_snapshot(config_dir: &Path, target: &str, subtarget: &str, version: &str) -> Result<()> {
    let configs = load_configs(config_dir)?;
    let request = BuildRequest::new(target, subtarget, version);
    let plan = BuildPlan::assemble(&request, &configs.openwrt, &configs.packages)?;

    let snapshot = BuildSnapshot::from_plan(&plan, Utc::now());
    println!("{}", snapshot.to_json()?);
    Ok(())
}
