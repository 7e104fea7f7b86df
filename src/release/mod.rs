// src/release/mod.rs

//! Release preparation for collected firmware
//!
//! Produces the checksum list, markdown release notes and a
//! [`ReleaseManifest`] describing what a publisher should upload. Talking
//! to a release host is left to [`ReleasePublisher`] implementations.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::build::{BuildSnapshot, SNAPSHOT_FILE};
use crate::config::OpenWrtConfig;
use crate::error::Result;

/// Extensions of files that are checksummed and published
pub const RELEASE_EXTENSIONS: &[&str] = &["bin", "buildinfo", "manifest"];

/// Checksum list written into the artifacts directory
pub const CHECKSUMS_FILE: &str = "sha256sums.txt";

/// Markdown release notes written into the artifacts directory
pub const NOTES_FILE: &str = "release_notes.md";

/// Manifest written into the artifacts directory
pub const MANIFEST_FILE: &str = "release.json";

const INSTALL_GUIDE_URL: &str = "https://openwrt.org/docs/guide-user/installation/start";

/// SHA-256 of one release file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    pub file: String,
    pub path: PathBuf,
    pub sha256: String,
}

fn is_release_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| RELEASE_EXTENSIONS.contains(&ext))
}

/// SHA-256 hex digest of a file, read in chunks
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Checksum every release file under `dir`, sorted by file name
pub fn compute_checksums(dir: &Path) -> Result<Vec<FileChecksum>> {
    let mut checksums = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_release_file(path) {
            continue;
        }
        let sha256 = sha256_file(path)?;
        debug!("{}  {}", sha256, path.display());
        checksums.push(FileChecksum {
            file: entry.file_name().to_string_lossy().into_owned(),
            path: path.to_path_buf(),
            sha256,
        });
    }
    checksums.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.path.cmp(&b.path)));
    Ok(checksums)
}

/// `sha256sum -c` compatible listing
pub fn render_sha256sums(checksums: &[FileChecksum]) -> String {
    checksums
        .iter()
        .map(|c| format!("{}  {}\n", c.sha256, c.file))
        .collect()
}

/// OpenWrt releases recorded by the build snapshots under `dir`
///
/// Sorted and de-duplicated; empty when no snapshot is present.
pub fn built_openwrt_versions(dir: &Path) -> Result<Vec<String>> {
    let mut versions = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() || entry.file_name() != SNAPSHOT_FILE {
            continue;
        }
        let snapshot: BuildSnapshot = serde_json::from_str(&fs::read_to_string(entry.path())?)?;
        versions.push(snapshot.openwrt_version);
    }
    versions.sort();
    versions.dedup();
    Ok(versions)
}

/// Markdown notes: targets, base packages, image checksums, verification
///
/// `openwrt_version` is the release the images were built from.
pub fn render_release_notes(
    version: &str,
    openwrt_version: &str,
    openwrt: &OpenWrtConfig,
    checksums: &[FileChecksum],
) -> String {
    let mut notes = format!("# OpenWrt Custom Build v{}\n\n", version);
    let openwrt_version = if openwrt_version.trim().is_empty() {
        "unknown"
    } else {
        openwrt_version
    };
    notes.push_str(&format!("OpenWrt Version: {}\n\n", openwrt_version));

    notes.push_str("## Included Targets\n\n");
    for target in openwrt.targets() {
        notes.push_str(&format!("- **{}**: {}\n", target, target.description));
    }

    notes.push_str("\n## Included Packages\n\n");
    for package in &openwrt.build.base_packages {
        notes.push_str(&format!("- {}\n", package));
    }

    notes.push_str("\n## Firmware Files\n\n");
    for checksum in checksums.iter().filter(|c| c.file.ends_with(".bin")) {
        notes.push_str(&format!("- **{}** - SHA256: `{}`\n", checksum.file, checksum.sha256));
    }

    notes.push_str("\n## Installation\n\n");
    notes.push_str("Please follow the official OpenWrt documentation for flashing instructions:\n");
    notes.push_str(INSTALL_GUIDE_URL);
    notes.push_str("\n\n## Verification\n\n");
    notes.push_str("To verify the downloaded firmware files, run:\n\n");
    notes.push_str(&format!("```bash\nsha256sum -c {}\n```\n", CHECKSUMS_FILE));
    notes
}

/// Everything needed to publish one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    /// Files to upload, checksum list included
    pub assets: Vec<PathBuf>,
}

impl ReleaseManifest {
    /// Versions containing `-` are published as prereleases
    pub fn new(version: &str, body: String, assets: Vec<PathBuf>) -> Self {
        Self {
            tag_name: format!("v{}", version),
            name: format!("OpenWrt Custom Build v{}", version),
            body,
            draft: false,
            prerelease: version.contains('-'),
            assets,
        }
    }
}

/// Publishes a prepared release to a release host
pub trait ReleasePublisher {
    /// Publish `manifest`, returning the URL of the created release
    fn publish(&self, manifest: &ReleaseManifest) -> Result<String>;
}

/// Write checksums, notes and manifest into `artifacts_dir`
pub fn prepare_release(version: &str, artifacts_dir: &Path, openwrt: &OpenWrtConfig) -> Result<ReleaseManifest> {
    info!("Preparing release {} from {}", version, artifacts_dir.display());
    let checksums = compute_checksums(artifacts_dir)?;

    let checksums_path = artifacts_dir.join(CHECKSUMS_FILE);
    fs::write(&checksums_path, render_sha256sums(&checksums))?;

    let built = built_openwrt_versions(artifacts_dir)?;
    let openwrt_version = if built.is_empty() {
        warn!(
            "No {} under {}, assuming OpenWrt {}",
            SNAPSHOT_FILE,
            artifacts_dir.display(),
            openwrt.default_version
        );
        openwrt.default_version.clone()
    } else {
        built.join(", ")
    };

    let body = render_release_notes(version, &openwrt_version, openwrt, &checksums);
    fs::write(artifacts_dir.join(NOTES_FILE), &body)?;

    let mut assets: Vec<PathBuf> = checksums.into_iter().map(|c| c.path).collect();
    assets.push(checksums_path);
    let manifest = ReleaseManifest::new(version, body, assets);

    fs::write(
        artifacts_dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest)?,
    )?;
    info!(
        "Release {} prepared with {} assets",
        manifest.tag_name,
        manifest.assets.len()
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildPlan, BuildRequest};
    use crate::config::{BuildSettings, TargetEntry};
    use chrono::Utc;
    use std::cell::RefCell;

    // sha256("firmware")
    const FIRMWARE_SHA: &str = "c3bf47ea1f4a4a605470313cacb3a44f4a461f68c6faeab07e737610cb5ac835";

    fn openwrt() -> OpenWrtConfig {
        OpenWrtConfig {
            default_version: "23.05.3".to_string(),
            targets: vec![TargetEntry {
                name: "x86".to_string(),
                subtarget: "64".to_string(),
                description: "Generic x86_64".to_string(),
            }],
            build: BuildSettings {
                base_packages: vec!["luci".to_string()],
                ..Default::default()
            },
        }
    }

    fn artifacts() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("x86_64_1.2.3")).unwrap();
        fs::write(dir.path().join("x86_64_1.2.3/z-image.bin"), b"firmware").unwrap();
        fs::write(dir.path().join("x86_64_1.2.3/a.manifest"), b"luci 1.0\n").unwrap();
        fs::write(dir.path().join("x86_64_1.2.3/version.txt"), b"Version: 1.2.3\n").unwrap();
        dir
    }

    #[test]
    fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_checksums_sorted_and_filtered() {
        let dir = artifacts();
        let checksums = compute_checksums(dir.path()).unwrap();
        let files: Vec<&str> = checksums.iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, ["a.manifest", "z-image.bin"]);
        assert_eq!(checksums[1].sha256, FIRMWARE_SHA);

        let listing = render_sha256sums(&checksums);
        assert_eq!(listing.lines().count(), 2);
        assert!(listing.ends_with("  z-image.bin\n"));
    }

    #[test]
    fn test_release_notes() {
        let checksums = vec![
            FileChecksum {
                file: "a.manifest".to_string(),
                path: PathBuf::from("a.manifest"),
                sha256: "00".to_string(),
            },
            FileChecksum {
                file: "image.bin".to_string(),
                path: PathBuf::from("image.bin"),
                sha256: FIRMWARE_SHA.to_string(),
            },
        ];
        let notes = render_release_notes("1.2.3", "23.05.3", &openwrt(), &checksums);
        assert!(notes.starts_with("# OpenWrt Custom Build v1.2.3\n\nOpenWrt Version: 23.05.3\n"));
        assert!(notes.contains("- **x86/64**: Generic x86_64\n"));
        assert!(notes.contains("## Included Packages\n\n- luci\n"));
        assert!(notes.contains(&format!("- **image.bin** - SHA256: `{}`\n", FIRMWARE_SHA)));
        assert!(!notes.contains("a.manifest"));
        assert!(notes.contains("sha256sum -c sha256sums.txt"));
    }

    #[test]
    fn test_manifest_prerelease() {
        assert!(ReleaseManifest::new("1.2.3-dev.3+20240115.abc1234", String::new(), vec![]).prerelease);
        let stable = ReleaseManifest::new("1.2.3", String::new(), vec![]);
        assert!(!stable.prerelease);
        assert_eq!(stable.tag_name, "v1.2.3");
        assert_eq!(stable.name, "OpenWrt Custom Build v1.2.3");
    }

    #[test]
    fn test_prepare_release() {
        let dir = artifacts();
        let manifest = prepare_release("1.2.3", dir.path(), &openwrt()).unwrap();

        assert_eq!(manifest.assets.len(), 3);
        assert_eq!(manifest.assets.last(), Some(&dir.path().join(CHECKSUMS_FILE)));
        assert!(dir.path().join(NOTES_FILE).is_file());

        let written: ReleaseManifest =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(written, manifest);
    }

    #[test]
    fn test_notes_use_built_openwrt_release() {
        let dir = artifacts();
        let (config, packages) = crate::build::tests::sample_config();
        let request = BuildRequest::new("x86", "64", "1.2.3").with_openwrt_version("22.03.6");
        let plan = BuildPlan::assemble(&request, &config, &packages).unwrap();
        BuildSnapshot::from_plan(&plan, Utc::now())
            .write_to(&dir.path().join("x86_64_1.2.3"))
            .unwrap();

        assert_eq!(built_openwrt_versions(dir.path()).unwrap(), ["22.03.6"]);
        let manifest = prepare_release("1.2.3", dir.path(), &openwrt()).unwrap();
        assert!(manifest.body.contains("OpenWrt Version: 22.03.6\n"));
        assert!(!manifest.body.contains("23.05.3"));
    }

    #[test]
    fn test_notes_fall_back_to_default_release() {
        let dir = artifacts();
        assert!(built_openwrt_versions(dir.path()).unwrap().is_empty());
        let manifest = prepare_release("1.2.3", dir.path(), &openwrt()).unwrap();
        assert!(manifest.body.contains("OpenWrt Version: 23.05.3\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = artifacts();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.bin"), b"firmware").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still read the directory
        let readable = fs::read_dir(&locked).is_ok();
        let result = compute_checksums(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            eprintln!("Skipping unreadable directory test: running with elevated privileges");
            return;
        }
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    struct RecordingPublisher {
        published: RefCell<Vec<String>>,
    }

    impl ReleasePublisher for RecordingPublisher {
        fn publish(&self, manifest: &ReleaseManifest) -> Result<String> {
            self.published.borrow_mut().push(manifest.tag_name.clone());
            Ok(format!("https://example.com/releases/{}", manifest.tag_name))
        }
    }

    #[test]
    fn test_publisher_receives_manifest() {
        let publisher = RecordingPublisher {
            published: RefCell::new(Vec::new()),
        };
        let manifest = ReleaseManifest::new("2.0.0", "notes".to_string(), vec![]);
        let url = publisher.publish(&manifest).unwrap();
        assert_eq!(url, "https://example.com/releases/v2.0.0");
        assert_eq!(*publisher.published.borrow(), ["v2.0.0"]);
    }
}
