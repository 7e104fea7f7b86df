// src/version/history.rs

//! Repository history queries feeding version derivation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use super::{SHORT_SHA_LEN, TagRef, latest_tag};
use crate::error::{Error, Result};

/// Everything version derivation needs from the history of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub tags: Vec<TagRef>,
    /// Commits after the latest tag, or all commits when untagged
    pub commits_since_latest_tag: u64,
    pub head_short_sha: String,
}

/// Source of tag/commit history
pub trait RepositoryHistory {
    fn snapshot(&self) -> Result<HistorySnapshot>;
}

/// History read from a git checkout through the `git` command
///
/// Every command runs with an explicit working directory; the process
/// working directory is never changed.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo_dir: PathBuf,
}

/// `for-each-ref` format: name, commit time of a lightweight tag, commit
/// time of the commit an annotated tag points at
const TAG_FORMAT: &str = "%(refname:short)%09%(committerdate:unix)%09%(*committerdate:unix)";

impl GitHistory {
    pub fn new(repo_dir: impl AsRef<Path>) -> Self {
        Self {
            repo_dir: repo_dir.as_ref().to_path_buf(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        debug!("Running git {} in {}", args.join(" "), self.repo_dir.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::History(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            return Err(Error::History(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn count_commits(&self, range: &str) -> Result<u64> {
        let out = self.git(&["rev-list", "--count", range])?;
        out.parse::<u64>()
            .map_err(|e| Error::History(format!("unexpected commit count {:?}: {}", out, e)))
    }
}

impl RepositoryHistory for GitHistory {
    fn snapshot(&self) -> Result<HistorySnapshot> {
        let listing = self.git(&["for-each-ref", &format!("--format={}", TAG_FORMAT), "refs/tags"])?;
        let tags = parse_tag_listing(&listing);

        let commits_since_latest_tag = match latest_tag(&tags) {
            Some(tag) => self.count_commits(&format!("{}..HEAD", tag.name))?,
            None => self.count_commits("HEAD")?,
        };
        let head_short_sha = self.git(&["rev-parse", &format!("--short={}", SHORT_SHA_LEN), "HEAD"])?;

        debug!(
            "History: {} tags, {} commits since latest, HEAD {}",
            tags.len(),
            commits_since_latest_tag,
            head_short_sha
        );

        Ok(HistorySnapshot {
            tags,
            commits_since_latest_tag,
            head_short_sha,
        })
    }
}

/// Parse tab-separated `for-each-ref` output into tags
///
/// Lines without a usable timestamp are skipped.
pub fn parse_tag_listing(listing: &str) -> Vec<TagRef> {
    listing
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let secs = fields
                .map(str::trim)
                .find(|field| !field.is_empty())?
                .parse::<i64>()
                .ok()?;
            let commit_time = DateTime::<Utc>::from_timestamp(secs, 0)?;
            Some(TagRef::new(name, commit_time))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lightweight_and_annotated() {
        let listing = "v1.0.0\t1700000000\t\nv1.1.0\t\t1700100000\n";
        let tags = parse_tag_listing(listing);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[0].commit_time.timestamp(), 1_700_000_000);
        assert_eq!(tags[1].name, "v1.1.0");
        assert_eq!(tags[1].commit_time.timestamp(), 1_700_100_000);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let listing = "\nbroken\t\t\nv2.0.0\tnot-a-number\t\nv2.1.0\t1700000000\t";
        let tags = parse_tag_listing(listing);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "v2.1.0");
    }

    #[test]
    fn test_missing_repository_is_history_error() {
        let history = GitHistory::new("/nonexistent/wrtforge/repo");
        assert!(matches!(history.snapshot(), Err(Error::History(_))));
    }
}
