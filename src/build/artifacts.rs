// src/build/artifacts.rs

//! Firmware artifact collection

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::target::Target;

/// File extensions copied out of the OpenWrt output tree
pub const ARTIFACT_EXTENSIONS: &[&str] = &["bin", "buildinfo", "manifest"];

/// Checksum file produced by OpenWrt next to the images
pub const CHECKSUM_FILE: &str = "sha256sums";

/// Version stamp written into every artifact directory
pub const VERSION_FILE: &str = "version.txt";

/// Whether `path` is a firmware artifact worth keeping
pub fn is_artifact(path: &Path) -> bool {
    if path.file_name().and_then(|n| n.to_str()) == Some(CHECKSUM_FILE) {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext))
}

/// `bin/targets/<target>/<subtarget>` inside an OpenWrt checkout
pub fn target_output_dir(work_dir: &Path, target: &Target) -> PathBuf {
    work_dir
        .join("bin")
        .join("targets")
        .join(&target.name)
        .join(&target.subtarget)
}

/// `<output_root>/<target>_<subtarget>_<version>`
pub fn artifact_dir(output_root: &Path, target: &Target, version: &str) -> PathBuf {
    output_root.join(format!("{}_{}_{}", target.name, target.subtarget, version))
}

/// Collected artifacts of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub dir: PathBuf,
    /// Copied file names, sorted
    pub files: Vec<String>,
}

/// Copy the firmware images of `target` into a versioned output directory
///
/// Writes `version.txt` containing the version and the build time.
pub fn collect_artifacts(
    work_dir: &Path,
    output_root: &Path,
    target: &Target,
    version: &str,
    built_at: DateTime<Utc>,
) -> Result<ArtifactSet> {
    let source = target_output_dir(work_dir, target);
    if !source.is_dir() {
        return Err(Error::ArtifactsMissing(source));
    }

    let dest = artifact_dir(output_root, target, version);
    fs::create_dir_all(&dest)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(&source)? {
        let path = entry?.path();
        if !path.is_file() || !is_artifact(&path) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        fs::copy(&path, dest.join(name))?;
        debug!("Copied {}", path.display());
        files.push(name.to_string_lossy().into_owned());
    }
    files.sort();

    fs::write(
        dest.join(VERSION_FILE),
        format!(
            "OpenWrt Custom Build\nVersion: {}\nTarget: {}\nSubtarget: {}\nBuild Date: {}\n",
            version,
            target.name,
            target.subtarget,
            built_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    )?;

    info!("Collected {} artifacts into {}", files.len(), dest.display());
    Ok(ArtifactSet { dir: dest, files })
}
