// src/build/snapshot.rs

//! Serializable record of what a build was configured with

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::BuildPlan;
use crate::error::Result;
use crate::feed::{RepositoryDefinition, redact};
use crate::resolver::{PackageDirectiveSet, RejectedPackage};

/// File name of the snapshot inside an artifact directory
pub const SNAPSHOT_FILE: &str = "build-snapshot.json";

/// Build configuration snapshot
///
/// Repositories are always stored redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSnapshot {
    /// `<target>_<subtarget>_<unix timestamp>`
    pub build_id: String,
    pub target: String,
    pub subtarget: String,
    pub openwrt_version: String,
    pub version: String,
    pub directives: PackageDirectiveSet,
    #[serde(default)]
    pub rejected: Vec<RejectedPackage>,
    pub repositories: Vec<RepositoryDefinition>,
    pub created_at: DateTime<Utc>,
}

impl BuildSnapshot {
    pub fn from_plan(plan: &BuildPlan, created_at: DateTime<Utc>) -> Self {
        Self {
            build_id: format!(
                "{}_{}_{}",
                plan.target.name,
                plan.target.subtarget,
                created_at.timestamp()
            ),
            target: plan.target.name.clone(),
            subtarget: plan.target.subtarget.clone(),
            openwrt_version: plan.openwrt_version.clone(),
            version: plan.version.clone(),
            directives: plan.resolution.directives.clone(),
            rejected: plan.resolution.rejected.clone(),
            repositories: redact(&plan.repositories),
            created_at,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot as `build-snapshot.json` into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(SNAPSHOT_FILE);
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}
