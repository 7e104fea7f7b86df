// src/commands/build.rs

//! Firmware build command

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use wrtforge::{BuildDriver, BuildPlan, BuildRequest, CancellationToken, MakeToolchain};

use super::{firmware_version, load_configs};

/// Arguments of `wrtforge build`
pub struct BuildArgs<'a> {
    pub config_dir: &'a Path,
    pub target: &'a str,
    pub subtarget: &'a str,
    pub work_dir: &'a Path,
    pub output_dir: &'a Path,
    pub openwrt_version: Option<&'a str>,
    pub firmware_version: Option<&'a str>,
    pub repo: &'a Path,
    pub timeout: Option<u64>,
}

/// Configure the checkout, run the toolchain and collect the images
pub fn cmd_build(args: BuildArgs<'_>) -> Result<()> {
    let configs = load_configs(args.config_dir)?;

    let version = match args.firmware_version {
        Some(version) => version.to_string(),
        None => firmware_version(args.repo, Utc::now().date_naive())?.to_string(),
    };

    let mut request = BuildRequest::new(args.target, args.subtarget, version);
    if let Some(openwrt_version) = args.openwrt_version {
        request = request.with_openwrt_version(openwrt_version);
    }
    let plan = BuildPlan::assemble(&request, &configs.openwrt, &configs.packages)?;
    for rejected in &plan.resolution.rejected {
        warn!("Skipped package {}", rejected);
    }

    let cancel = match args.timeout {
        Some(secs) => {
            info!("Build deadline: {}s", secs);
            CancellationToken::with_timeout(Duration::from_secs(secs))
        }
        None => CancellationToken::new(),
    };

    let driver = BuildDriver::new(MakeToolchain::new(), args.work_dir, args.output_dir)
        .with_cancellation(cancel);
    let outcome = driver
        .run(&plan)
        .with_context(|| format!("Build for {} failed", plan.target))?;

    println!("Build {} complete", outcome.snapshot.build_id);
    println!("  Version:   {}", plan.version);
    println!("  Artifacts: {}", outcome.artifacts.dir.display());
    for file in &outcome.artifacts.files {
        println!("    {}", file);
    }
    println!("  Duration:  {:.1}s", outcome.duration.as_secs_f64());
    Ok(())
}
