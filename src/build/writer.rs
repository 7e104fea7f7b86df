// src/build/writer.rs

//! Crash-safe writes into the OpenWrt checkout
//!
//! Files are written to `<file>.partial` and renamed into place only once
//! the stage that produced them has finished. A stage that is cancelled or
//! fails leaves `<file>.incomplete` behind instead, so a half-written
//! `.config` is never mistaken for a good one.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

const PARTIAL_SUFFIX: &str = "partial";
const INCOMPLETE_SUFFIX: &str = "incomplete";

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Writes files through `.partial` staging files
#[derive(Debug, Clone, Default)]
pub struct ConfigWriter;

impl ConfigWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `content` to the staging file for `target`
    ///
    /// Any stale `.incomplete` marker from an earlier run is removed.
    pub fn stage(&self, target: &Path, content: &str) -> Result<PendingArtifact> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let incomplete = with_suffix(target, INCOMPLETE_SUFFIX);
        if incomplete.exists() {
            fs::remove_file(&incomplete)?;
        }

        let partial = with_suffix(target, PARTIAL_SUFFIX);
        fs::write(&partial, content)?;
        debug!("Staged {} ({} bytes)", partial.display(), content.len());
        Ok(PendingArtifact {
            target: target.to_path_buf(),
            partial,
        })
    }

    /// Stage and commit in one step
    pub fn write(&self, target: &Path, content: &str) -> Result<()> {
        self.stage(target, content)?.commit()
    }
}

/// A staged file awaiting commit
#[derive(Debug)]
#[must_use = "a staged file must be committed or marked incomplete"]
pub struct PendingArtifact {
    target: PathBuf,
    partial: PathBuf,
}

impl PendingArtifact {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// Atomically rename the staging file over the target
    pub fn commit(self) -> Result<()> {
        fs::rename(&self.partial, &self.target)?;
        debug!("Committed {}", self.target.display());
        Ok(())
    }

    /// Rename the staging file to `<file>.incomplete` with a reason header
    pub fn mark_incomplete(self, reason: &str) -> Result<PathBuf> {
        mark_incomplete(&self.partial, &self.target, reason)
    }
}

/// Move `source` to `<target>.incomplete`, prefixed with `# INCOMPLETE: <reason>`
///
/// Used both for staged files and for files already committed into the
/// checkout whose later processing stage did not finish.
pub fn mark_incomplete(source: &Path, target: &Path, reason: &str) -> Result<PathBuf> {
    let incomplete = with_suffix(target, INCOMPLETE_SUFFIX);
    let body = fs::read_to_string(source)?;
    let reason = reason.replace('\n', " ");
    fs::write(&incomplete, format!("# INCOMPLETE: {}\n{}", reason, body))?;
    fs::remove_file(source)?;
    warn!("Left {} ({})", incomplete.display(), reason);
    Ok(incomplete)
}
