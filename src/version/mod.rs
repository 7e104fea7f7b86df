// src/version/mod.rs

//! Firmware version derivation from repository history
//!
//! Firmware builds are labelled with a semantic version computed from the
//! project's tags and commits:
//!
//! - Exactly on a tag `v1.2.3`: `1.2.3`
//! - Three commits past it: `1.2.3-dev.3+20240115.abc1234`
//! - No tags at all: `0.1.0-dev.<N>+<date>.<sha>`
//!
//! Derivation never fails. A tag that is not a semantic version falls back
//! to the `0.1.0` base instead of aborting the build.

mod history;

pub use history::{GitHistory, HistorySnapshot, RepositoryHistory, parse_tag_listing};

use chrono::{DateTime, NaiveDate, Utc};
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Base version used when no usable tag exists
pub const FALLBACK_VERSION: Version = Version::new(0, 1, 0);

/// Length of the commit hash in build metadata
pub const SHORT_SHA_LEN: usize = 7;

/// A tag and the commit time of the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
    pub commit_time: DateTime<Utc>,
}

impl TagRef {
    pub fn new(name: impl Into<String>, commit_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            commit_time,
        }
    }

    /// Parse the tag name as a version, ignoring one leading `v`
    pub fn version(&self) -> Option<Version> {
        let name = self.name.strip_prefix('v').unwrap_or(&self.name);
        Version::parse(name).ok()
    }
}

/// A derived firmware version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionString(Version);

impl VersionString {
    pub fn as_semver(&self) -> &Version {
        &self.0
    }

    /// Whether this is a development build (has a pre-release segment)
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }
}

impl fmt::Display for VersionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<VersionString> for String {
    fn from(version: VersionString) -> Self {
        version.to_string()
    }
}

/// Select the tag with the latest commit time
///
/// Ties go to the tag appearing last in `tags`.
pub fn latest_tag(tags: &[TagRef]) -> Option<&TagRef> {
    tags.iter().fold(None, |latest: Option<&TagRef>, tag| match latest {
        Some(current) if tag.commit_time < current.commit_time => Some(current),
        _ => Some(tag),
    })
}

/// Derive the firmware version for a history snapshot
///
/// `commits_since_latest_tag` is the total commit count when there are no
/// tags. `head_short_sha` is cut to [`SHORT_SHA_LEN`] characters.
pub fn derive_version(
    tags: &[TagRef],
    commits_since_latest_tag: u64,
    head_short_sha: &str,
    now: NaiveDate,
) -> VersionString {
    let latest = latest_tag(tags);
    let base = match latest {
        Some(tag) => tag.version().unwrap_or_else(|| {
            debug!("Tag {} is not a semantic version, using {}", tag.name, FALLBACK_VERSION);
            FALLBACK_VERSION
        }),
        None => FALLBACK_VERSION,
    };

    if latest.is_some() && commits_since_latest_tag == 0 {
        return VersionString(base);
    }

    let mut version = Version::new(base.major, base.minor, base.patch);
    if commits_since_latest_tag > 0 {
        version.pre = Prerelease::new(&format!("dev.{}", commits_since_latest_tag))
            .unwrap_or(Prerelease::EMPTY);
    }
    version.build = build_metadata(now, head_short_sha);

    VersionString(version)
}

/// Derive a version from a history snapshot
pub fn derive_from_snapshot(snapshot: &HistorySnapshot, now: NaiveDate) -> VersionString {
    derive_version(
        &snapshot.tags,
        snapshot.commits_since_latest_tag,
        &snapshot.head_short_sha,
        now,
    )
}

/// `<YYYYMMDD>.<sha>`, or just the date when the hash is unusable
fn build_metadata(now: NaiveDate, head_short_sha: &str) -> BuildMetadata {
    let date = now.format("%Y%m%d").to_string();
    let sha: String = head_short_sha.trim().chars().take(SHORT_SHA_LEN).collect();

    if !sha.is_empty() {
        if let Ok(build) = BuildMetadata::new(&format!("{}.{}", date, sha)) {
            return build;
        }
        debug!("Commit hash {:?} is not valid build metadata, omitting it", sha);
    }
    BuildMetadata::new(&date).unwrap_or(BuildMetadata::EMPTY)
}
