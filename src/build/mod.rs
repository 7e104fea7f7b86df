// src/build/mod.rs

//! OpenWrt firmware build orchestration
//!
//! A build runs in two halves:
//!
//! 1. [`BuildPlan::assemble`] turns a [`BuildRequest`] plus the loaded
//!    configuration into everything the toolchain needs: resolved package
//!    directives, feed registrations and the rendered `.config`. This half
//!    is pure and touches no files.
//! 2. [`BuildDriver::run`] applies the plan to an OpenWrt checkout and runs
//!    the toolchain stage by stage, then collects the firmware images.
//!
//! Stages run strictly in sequence. The driver checks its
//! [`CancellationToken`] between stages and the toolchain checks it while a
//! step is running.

mod artifacts;
mod snapshot;
mod toolchain;
mod writer;

pub use artifacts::{
    ARTIFACT_EXTENSIONS, ArtifactSet, CHECKSUM_FILE, VERSION_FILE, artifact_dir,
    collect_artifacts, is_artifact, target_output_dir,
};
pub use snapshot::{BuildSnapshot, SNAPSHOT_FILE};
pub use toolchain::{
    CancelReason, CancellationToken, MakeToolchain, ToolchainError, ToolchainInvoker,
    ToolchainStep,
};
pub use writer::{ConfigWriter, PendingArtifact, mark_incomplete};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{OpenWrtConfig, PackagesConfig};
use crate::error::{Error, Result};
use crate::feed::{FeedLine, RepositoryDefinition, redact, register_feeds};
use crate::render::{render_config, render_feeds, render_feeds_redacted};
use crate::resolver::{Resolution, resolve};
use crate::target::{Target, scope_key};

/// Feed configuration read by `scripts/feeds`
pub const FEEDS_CONF: &str = "feeds.conf";

/// Stock feeds shipped with the OpenWrt tree
pub const FEEDS_CONF_DEFAULT: &str = "feeds.conf.default";

/// Kernel and package configuration read by `make`
pub const CONFIG_FILE: &str = ".config";

/// What to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub target: String,
    pub subtarget: String,
    /// OpenWrt release; falls back to `default_version` of `openwrt.yml`
    #[serde(default)]
    pub openwrt_version: Option<String>,
    /// Firmware version stamped into the image
    pub version: String,
}

impl BuildRequest {
    pub fn new(
        target: impl Into<String>,
        subtarget: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            subtarget: subtarget.into(),
            openwrt_version: None,
            version: version.into(),
        }
    }

    pub fn with_openwrt_version(mut self, version: impl Into<String>) -> Self {
        self.openwrt_version = Some(version.into());
        self
    }
}

/// Everything needed to configure one build
///
/// `feeds` hold authenticated URLs; `repositories` are redacted and safe to
/// log or persist.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub target: Target,
    pub openwrt_version: String,
    pub version: String,
    pub resolution: Resolution,
    pub feeds: Vec<FeedLine>,
    pub repositories: Vec<RepositoryDefinition>,
    pub config_text: String,
    pub jobs: usize,
}

impl BuildPlan {
    /// Resolve a request against the loaded configuration
    pub fn assemble(
        request: &BuildRequest,
        openwrt: &OpenWrtConfig,
        packages: &PackagesConfig,
    ) -> Result<Self> {
        scope_key(&request.target, &request.subtarget)?;
        let target = openwrt
            .find_target(&request.target, &request.subtarget)
            .ok_or_else(|| {
                Error::UnknownTarget(format!("{}/{}", request.target, request.subtarget))
            })?;

        let openwrt_version = request
            .openwrt_version
            .clone()
            .unwrap_or_else(|| openwrt.default_version.clone());
        if openwrt_version.trim().is_empty() {
            return Err(Error::Configuration(
                "no OpenWrt version requested and no default_version configured".to_string(),
            ));
        }
        if request.version.trim().is_empty() {
            return Err(Error::Configuration("firmware version must not be empty".to_string()));
        }

        let resolution = resolve(
            &target.name,
            &target.subtarget,
            &openwrt.build.base_packages,
            &packages.policy,
            &packages.repositories,
        )?;
        let feeds = register_feeds(&packages.repositories);
        let config_text = render_config(
            &target,
            &openwrt.build.kernel_config,
            &resolution.directives,
            &request.version,
        );

        Ok(Self {
            target,
            openwrt_version,
            version: request.version.clone(),
            resolution,
            feeds,
            repositories: redact(&packages.repositories),
            config_text,
            jobs: openwrt.build.effective_jobs(),
        })
    }
}

/// Build stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum BuildStage {
    Checkout,
    WriteFeeds,
    UpdateFeeds,
    InstallFeeds,
    WriteConfig,
    Defconfig,
    Compile,
    CollectArtifacts,
}

impl BuildStage {
    pub fn all() -> &'static [BuildStage] {
        &[
            Self::Checkout,
            Self::WriteFeeds,
            Self::UpdateFeeds,
            Self::InstallFeeds,
            Self::WriteConfig,
            Self::Defconfig,
            Self::Compile,
            Self::CollectArtifacts,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Checkout => "Check out OpenWrt release",
            Self::WriteFeeds => "Write feeds.conf",
            Self::UpdateFeeds => "Update feeds",
            Self::InstallFeeds => "Install feeds",
            Self::WriteConfig => "Write .config",
            Self::Defconfig => "Expand .config",
            Self::Compile => "Compile firmware",
            Self::CollectArtifacts => "Collect artifacts",
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of a completed build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub artifacts: ArtifactSet,
    pub snapshot: BuildSnapshot,
    pub snapshot_path: PathBuf,
    pub duration: Duration,
}

/// Applies a [`BuildPlan`] to an OpenWrt checkout
pub struct BuildDriver<T: ToolchainInvoker> {
    toolchain: T,
    work_dir: PathBuf,
    output_root: PathBuf,
    cancel: CancellationToken,
    writer: ConfigWriter,
}

impl<T: ToolchainInvoker> BuildDriver<T> {
    /// Driver for the checkout at `work_dir`, collecting into `output_root`
    pub fn new(toolchain: T, work_dir: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            work_dir: work_dir.into(),
            output_root: output_root.into(),
            cancel: CancellationToken::new(),
            writer: ConfigWriter::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops this driver's builds
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run every stage of `plan`
    pub fn run(&self, plan: &BuildPlan) -> Result<BuildOutcome> {
        let started = Instant::now();
        info!(
            "Building firmware {} for {} on OpenWrt {}",
            plan.version, plan.target, plan.openwrt_version
        );
        if !self.work_dir.is_dir() {
            return Err(Error::Configuration(format!(
                "OpenWrt checkout {} does not exist",
                self.work_dir.display()
            )));
        }

        self.invoke(
            BuildStage::Checkout,
            &ToolchainStep::checkout(&self.work_dir, &plan.openwrt_version),
        )?;

        self.enter(BuildStage::WriteFeeds)?;
        let feeds_conf = self.work_dir.join(FEEDS_CONF);
        self.writer.write(&feeds_conf, &self.feeds_conf_text(&plan.feeds)?)?;
        debug!("Feeds registered:\n{}", render_feeds_redacted(&plan.feeds));

        self.invoke(BuildStage::UpdateFeeds, &ToolchainStep::feeds(&self.work_dir, "update"))?;
        self.invoke(BuildStage::InstallFeeds, &ToolchainStep::feeds(&self.work_dir, "install"))?;

        self.enter(BuildStage::WriteConfig)?;
        let config_path = self.work_dir.join(CONFIG_FILE);
        let pending = self.writer.stage(&config_path, &plan.config_text)?;
        if let Some(reason) = self.cancel.reason() {
            pending.mark_incomplete(&reason.to_string())?;
            return Err(ToolchainError::interrupted(BuildStage::WriteConfig.name(), reason).into());
        }
        pending.commit()?;

        self.invoke_with_config(BuildStage::Defconfig, &ToolchainStep::defconfig(), &config_path)?;
        self.invoke_with_config(BuildStage::Compile, &ToolchainStep::compile(plan.jobs), &config_path)?;

        self.enter(BuildStage::CollectArtifacts)?;
        let built_at = Utc::now();
        let artifacts = collect_artifacts(
            &self.work_dir,
            &self.output_root,
            &plan.target,
            &plan.version,
            built_at,
        )?;
        let snapshot = BuildSnapshot::from_plan(plan, built_at);
        let snapshot_path = snapshot.write_to(&artifacts.dir)?;

        let duration = started.elapsed();
        info!(
            "Build {} finished in {:.1}s, artifacts in {}",
            snapshot.build_id,
            duration.as_secs_f64(),
            artifacts.dir.display()
        );
        Ok(BuildOutcome {
            artifacts,
            snapshot,
            snapshot_path,
            duration,
        })
    }

    /// `feeds.conf.default` of the checkout followed by the plan's feeds
    fn feeds_conf_text(&self, feeds: &[FeedLine]) -> Result<String> {
        let default_path = self.work_dir.join(FEEDS_CONF_DEFAULT);
        let mut text = if default_path.is_file() {
            fs::read_to_string(&default_path)?
        } else {
            String::new()
        };
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&render_feeds(feeds));
        Ok(text)
    }

    fn enter(&self, stage: BuildStage) -> Result<()> {
        if let Some(reason) = self.cancel.reason() {
            warn!("Stopping before {}: {}", stage, reason);
            return Err(ToolchainError::interrupted(stage.name(), reason).into());
        }
        info!("Stage: {}", stage);
        Ok(())
    }

    fn invoke(&self, stage: BuildStage, step: &ToolchainStep) -> Result<()> {
        self.enter(stage)?;
        self.toolchain.run(step, &self.work_dir, &self.cancel)?;
        Ok(())
    }

    /// Run a step that consumes `.config`; an interrupted run or a failed
    /// expansion leaves the file marked incomplete.
    fn invoke_with_config(&self, stage: BuildStage, step: &ToolchainStep, config: &Path) -> Result<()> {
        let result = self.enter(stage).and_then(|()| {
            self.toolchain
                .run(step, &self.work_dir, &self.cancel)
                .map_err(Error::from)
        });
        let Err(err) = result else {
            return Ok(());
        };

        let invalidates_config = match &err {
            Error::Toolchain(e) => e.is_interrupted() || stage == BuildStage::Defconfig,
            _ => false,
        };
        if invalidates_config && config.is_file() {
            if let Err(mark_err) = mark_incomplete(config, config, &err.to_string()) {
                warn!("Could not mark {} incomplete: {}", config.display(), mark_err);
            }
        }
        Err(err)
    }
}
