// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose selects debug
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve {
            config,
            target,
            json,
        } => commands::cmd_resolve(&config.config_dir, &target.target, &target.subtarget, json),

        Commands::Feeds { config } => commands::cmd_feeds(&config.config_dir),

        Commands::Version {
            repo,
            tag,
            commits,
            sha,
            date,
        } => commands::cmd_version(&repo, tag.as_deref(), commits, &sha, date.as_deref()),

        Commands::Build {
            config,
            target,
            work_dir,
            output_dir,
            openwrt_version,
            firmware_version,
            repo,
            timeout,
        } => commands::cmd_build(commands::BuildArgs {
            config_dir: &config.config_dir,
            target: &target.target,
            subtarget: &target.subtarget,
            work_dir: &work_dir,
            output_dir: &output_dir,
            openwrt_version: openwrt_version.as_deref(),
            firmware_version: firmware_version.as_deref(),
            repo: &repo,
            timeout,
        }),

        Commands::Release {
            config,
            release_version,
            artifacts_dir,
        } => commands::cmd_release(&config.config_dir, &release_version, &artifacts_dir),

        Commands::Snapshot {
            config,
            target,
            firmware_version,
        } => commands::cmd_snapshot(
            &config.config_dir,
            &target.target,
            &target.subtarget,
            &firmware_version,
        ),
    }
}
