// src/commands/version.rs

//! Firmware version command

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::Path;
use tracing::info;
use wrtforge::version::derive_from_snapshot;
use wrtforge::{GitHistory, RepositoryHistory, TagRef, VersionString, derive_version};

/// Derive the firmware version from the git history of `repo`
pub fn firmware_version(repo: &Path, today: NaiveDate) -> Result<VersionString> {
    let snapshot = GitHistory::new(repo)
        .snapshot()
        .with_context(|| format!("Failed to read history of {}", repo.display()))?;
    let version = derive_from_snapshot(&snapshot, today);
    info!(
        "Derived version {} ({} tags, {} commits since latest)",
        version,
        snapshot.tags.len(),
        snapshot.commits_since_latest_tag
    );
    Ok(version)
}

/// Print the derived firmware version
///
/// With `tag` set, the history is taken from the arguments instead of git.
pub fn cmd_version(
    repo: &Path,
    tag: Option<&str>,
    commits: u64,
    sha: &str,
    date: Option<&str>,
) -> Result<()> {
    let today = match date {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?,
        None => Utc::now().date_naive(),
    };

    let version = match tag {
        Some(tag) => derive_version(&[TagRef::new(tag, Utc::now())], commits, sha, today),
        None => firmware_version(repo, today)?,
    };
    println!("{}", version);
    Ok(())
}
