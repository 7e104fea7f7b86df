// src/config/parser.rs

//! Typed build configuration files

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::feed::RepositoryDefinition;
use crate::policy::PackagePolicy;
use crate::resolver::validate_package_name;
use crate::target::Target;

/// Contents of `openwrt.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenWrtConfig {
    /// OpenWrt release built when a request does not name one
    #[serde(default, deserialize_with = "string_or_number")]
    pub default_version: String,

    #[serde(default)]
    pub targets: Vec<TargetEntry>,

    #[serde(default)]
    pub build: BuildSettings,
}

/// One target declaration
///
/// YAML users write `subtarget: 64`; numbers are accepted and kept as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEntry {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub subtarget: String,
    #[serde(default)]
    pub description: String,
}

impl From<&TargetEntry> for Target {
    fn from(entry: &TargetEntry) -> Self {
        Target::new(&entry.name, &entry.subtarget).with_description(&entry.description)
    }
}

/// `build` section of `openwrt.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Parallel make jobs; defaults to the host CPU count
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Packages enabled for every target
    #[serde(default)]
    pub base_packages: Vec<String>,

    /// Raw kernel options appended to `.config`
    #[serde(default)]
    pub kernel_config: Vec<String>,
}

impl BuildSettings {
    pub fn effective_jobs(&self) -> usize {
        self.jobs.filter(|jobs| *jobs > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        })
    }
}

/// Contents of `packages.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackagesConfig {
    #[serde(flatten)]
    pub policy: PackagePolicy,

    #[serde(default)]
    pub repositories: Vec<RepositoryDefinition>,
}

impl OpenWrtConfig {
    pub fn targets(&self) -> Vec<Target> {
        self.targets.iter().map(Target::from).collect()
    }

    /// Look up a declared target
    pub fn find_target(&self, name: &str, subtarget: &str) -> Option<Target> {
        self.targets
            .iter()
            .find(|t| t.name == name && t.subtarget == subtarget)
            .map(Target::from)
    }

    /// Check target declarations
    ///
    /// Names become `CONFIG_TARGET_<name>_<subtarget>` symbols, so they are
    /// held to the package name character set.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.targets {
            let key = Target::from(entry).scope_key()?;
            for (field, value) in [("name", &entry.name), ("subtarget", &entry.subtarget)] {
                if let Err(violation) = validate_package_name(value) {
                    return Err(Error::Configuration(format!(
                        "target {} {:?} is invalid: {}",
                        field, value, violation
                    )));
                }
            }
            if !seen.insert(key) {
                return Err(Error::Configuration(format!(
                    "target {}/{} is declared more than once",
                    entry.name, entry.subtarget
                )));
            }
        }
        Ok(())
    }
}

impl PackagesConfig {
    /// Check policy scopes and repository declarations
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;

        let mut seen = HashSet::new();
        for repo in &self.repositories {
            if repo.name.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "repository with URL {} has no name",
                    repo.redacted().url
                )));
            }
            if repo.name.chars().any(char::is_whitespace) {
                return Err(Error::Configuration(format!(
                    "repository name {:?} contains whitespace",
                    repo.name
                )));
            }
            if repo.url.trim().is_empty() {
                return Err(Error::Configuration(format!("repository {} has no URL", repo.name)));
            }
            if !seen.insert(repo.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "repository {} is declared more than once",
                    repo.name
                )));
            }
        }
        Ok(())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    })
}
