// src/cli/mod.rs
//! CLI definitions for wrtforge
//!
//! Argument parsing only; the command implementations live in the
//! `commands` module.
//!
//! - `resolve` - Show the package directives for a target
//! - `feeds` - Show feed registrations with credentials masked
//! - `version` - Derive the firmware version from git history
//! - `build` - Configure an OpenWrt checkout and build firmware
//! - `release` - Write checksums, notes and manifest for built firmware
//! - `snapshot` - Print the redacted build configuration as JSON

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wrtforge")]
#[command(author = "wrtforge contributors")]
#[command(version)]
#[command(about = "OpenWrt firmware build configurator", long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration directory holding openwrt.yml and packages.yml
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration directory
    #[arg(short, long, default_value = "config")]
    pub config_dir: PathBuf,
}

/// Target selection
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Target platform, e.g. x86
    #[arg(short, long)]
    pub target: String,

    /// Subtarget, e.g. 64
    #[arg(short, long)]
    pub subtarget: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the package directives for a target
    Resolve {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show feed registrations with credentials masked
    Feeds {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Derive the firmware version
    Version {
        /// Git checkout to read tags and commits from
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Use this tag instead of reading history from --repo
        #[arg(long)]
        tag: Option<String>,

        /// Commits since the tag (with --tag)
        #[arg(long, default_value_t = 0)]
        commits: u64,

        /// Short commit hash (with --tag)
        #[arg(long, default_value = "")]
        sha: String,

        /// Build date as YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        date: Option<String>,
    },

    /// Configure an OpenWrt checkout and build firmware
    Build {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// OpenWrt checkout to build in
        #[arg(short, long)]
        work_dir: PathBuf,

        /// Directory receiving versioned artifact directories
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// OpenWrt release tag checked out in --work-dir (default: default_version from openwrt.yml)
        #[arg(long)]
        openwrt_version: Option<String>,

        /// Firmware version (default: derived from the git history of --repo)
        #[arg(long = "firmware-version")]
        firmware_version: Option<String>,

        /// Git checkout the firmware version is derived from
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Abort the build after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Write checksums, release notes and manifest for built firmware
    Release {
        #[command(flatten)]
        config: ConfigArgs,

        /// Release version
        #[arg(long = "release-version")]
        release_version: String,

        /// Directory containing build artifacts
        #[arg(short, long)]
        artifacts_dir: PathBuf,
    },

    /// Print the redacted build configuration as JSON
    Snapshot {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Firmware version recorded in the snapshot
        #[arg(long = "firmware-version", default_value = "0.1.0")]
        firmware_version: String,
    },
}
