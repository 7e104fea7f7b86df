// src/build/toolchain.rs

//! OpenWrt toolchain invocation with cancellation
//!
//! Each step runs as a child process with an explicit working directory.
//! While a step runs, the invoker polls the child and the caller's
//! [`CancellationToken`]; a cancelled or expired token kills the child.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// How often a running step checks for cancellation
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Errors from running toolchain steps
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("Failed to start {step}: {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} failed with exit code {code}")]
    Failed { step: String, code: i32 },

    #[error("{step} was cancelled")]
    Cancelled { step: String },

    #[error("{step} exceeded the build deadline")]
    TimedOut { step: String },

    #[error("Failed to wait for {step}: {source}")]
    Wait {
        step: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolchainError {
    /// Whether the step was stopped by the caller rather than failing
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::TimedOut { .. })
    }

    /// Error for `step` stopped by a fired [`CancellationToken`]
    pub fn interrupted(step: impl Into<String>, reason: CancelReason) -> Self {
        let step = step.into();
        match reason {
            CancelReason::Cancelled => Self::Cancelled { step },
            CancelReason::DeadlineExceeded => Self::TimedOut { step },
        }
    }
}

/// Why a [`CancellationToken`] fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::DeadlineExceeded => write!(f, "build deadline exceeded"),
        }
    }
}

/// Caller-supplied stop signal, optionally with a deadline
///
/// Clones share the same flag, so another thread can cancel a running
/// build.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires once `timeout` has elapsed from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// `Some` once the token has been cancelled or its deadline has passed
    pub fn reason(&self) -> Option<CancelReason> {
        if self.flag.load(Ordering::SeqCst) {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }
}

/// One command of the build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainStep {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolchainStep {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `git -C <work_dir> checkout --quiet v<openwrt_version>`
    ///
    /// OpenWrt tags releases as `v<version>`; a leading `v` in the request
    /// is accepted.
    pub fn checkout(work_dir: &Path, openwrt_version: &str) -> Self {
        let version = openwrt_version.strip_prefix('v').unwrap_or(openwrt_version);
        Self::new("git")
            .arg("-C")
            .arg(work_dir.to_string_lossy())
            .arg("checkout")
            .arg("--quiet")
            .arg(format!("v{}", version))
    }

    /// `<work_dir>/scripts/feeds <action> -a`
    pub fn feeds(work_dir: &Path, action: &str) -> Self {
        Self::new(work_dir.join("scripts").join("feeds")).arg(action).arg("-a")
    }

    /// `make defconfig`
    pub fn defconfig() -> Self {
        Self::new("make").arg("defconfig")
    }

    /// `make -j<jobs> V=s`
    pub fn compile(jobs: usize) -> Self {
        Self::new("make").arg(format!("-j{}", jobs.max(1))).arg("V=s")
    }
}

impl fmt::Display for ToolchainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self
            .program
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.program.to_string_lossy());
        write!(f, "{}", program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs toolchain steps
pub trait ToolchainInvoker {
    /// Run `step` in `work_dir`, stopping early when `cancel` fires
    fn run(
        &self,
        step: &ToolchainStep,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ToolchainError>;
}

/// Invoker running real processes
///
/// Output is inherited so `make V=s` streams straight to the terminal or
/// log of the caller.
#[derive(Debug, Clone)]
pub struct MakeToolchain {
    poll_interval: Duration,
}

impl Default for MakeToolchain {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl MakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how often running steps check for cancellation
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl ToolchainInvoker for MakeToolchain {
    fn run(
        &self,
        step: &ToolchainStep,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ToolchainError> {
        let label = step.to_string();
        if let Some(reason) = cancel.reason() {
            return Err(ToolchainError::interrupted(label, reason));
        }

        info!("Running {} in {}", label, work_dir.display());
        let started = Instant::now();
        let mut child = Command::new(&step.program)
            .args(&step.args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ToolchainError::Spawn {
                step: label.clone(),
                source,
            })?;

        loop {
            let waited = child
                .wait_timeout(self.poll_interval)
                .map_err(|source| ToolchainError::Wait {
                    step: label.clone(),
                    source,
                })?;

            if let Some(status) = waited {
                if status.success() {
                    info!("{} finished in {:.1}s", label, started.elapsed().as_secs_f64());
                    return Ok(());
                }
                return Err(ToolchainError::Failed {
                    step: label,
                    code: status.code().unwrap_or(-1),
                });
            }

            if let Some(reason) = cancel.reason() {
                debug!("Stopping {} ({:?})", label, reason);
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolchainError::interrupted(label, reason));
            }
        }
    }
}
