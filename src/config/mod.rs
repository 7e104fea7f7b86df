// src/config/mod.rs

//! Build configuration loading
//!
//! A configuration directory holds two files:
//!
//! - `openwrt.yml`: OpenWrt release, targets, base packages, kernel options
//! - `packages.yml`: scoped include/exclude policy and package repositories
//!
//! Either file may also be written as `.yaml` or `.toml`; the format follows
//! the extension. Files are loaded from an explicit directory, never from
//! the process working directory implicitly.

pub mod parser;

pub use parser::{BuildSettings, OpenWrtConfig, PackagesConfig, TargetEntry};

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::error::Result;

/// Base name of the OpenWrt configuration file
pub const OPENWRT_CONFIG_STEM: &str = "openwrt";

/// Base name of the packages configuration file
pub const PACKAGES_CONFIG_STEM: &str = "packages";

/// Extensions tried, in order, when looking up a configuration file
const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml", "toml"];

/// Errors reading or parsing configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {stem}.yml, {stem}.yaml or {stem}.toml in {dir}")]
    NotFound { stem: String, dir: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Both configuration files of a configuration directory
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
    pub openwrt: OpenWrtConfig,
    pub packages: PackagesConfig,
}

impl ConfigSet {
    /// Load and validate `openwrt.*` and `packages.*` from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let openwrt = load_openwrt_config(dir)?;
        let packages = load_packages_config(dir)?;
        Ok(Self { openwrt, packages })
    }
}

/// Find `<stem>.<ext>` in `dir` for the first supported extension
pub fn find_config_file(dir: &Path, stem: &str) -> std::result::Result<PathBuf, ConfigError> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigError::NotFound {
            stem: stem.to_string(),
            dir: dir.to_path_buf(),
        })
}

/// Parse a configuration file, choosing the format from its extension
pub fn parse_config_file<T: DeserializeOwned>(path: &Path) -> std::result::Result<T, ConfigError> {
    debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    if is_toml {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else if content.trim().is_empty() {
        // An empty YAML document means "all defaults"
        serde_yaml::from_str("{}").map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load and validate the OpenWrt configuration from `dir`
pub fn load_openwrt_config(dir: &Path) -> Result<OpenWrtConfig> {
    let path = find_config_file(dir, OPENWRT_CONFIG_STEM)?;
    let config: OpenWrtConfig = parse_config_file(&path)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the packages configuration from `dir`
pub fn load_packages_config(dir: &Path) -> Result<PackagesConfig> {
    let path = find_config_file(dir, PACKAGES_CONFIG_STEM)?;
    let config: PackagesConfig = parse_config_file(&path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_openwrt_config(dir.path());
        assert!(matches!(result, Err(Error::Config(ConfigError::NotFound { .. }))));
    }

    #[test]
    fn test_yml_preferred_over_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("packages.toml"), "[include_packages]\nall = [\"from-toml\"]\n").unwrap();
        fs::write(dir.path().join("packages.yml"), "include_packages:\n  all: [from-yaml]\n").unwrap();

        let config = load_packages_config(dir.path()).unwrap();
        assert_eq!(config.policy.global_includes(), ["from-yaml"]);
    }

    #[test]
    fn test_toml_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("openwrt.toml"),
            "default_version = \"23.05.3\"\n\n[[targets]]\nname = \"x86\"\nsubtarget = \"64\"\n",
        )
        .unwrap();

        let config = load_openwrt_config(dir.path()).unwrap();
        assert_eq!(config.default_version, "23.05.3");
        assert_eq!(config.targets().len(), 1);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("packages.yml"), "").unwrap();
        let config = load_packages_config(dir.path()).unwrap();
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_malformed_policy_structure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("packages.yml"), "include_packages: [htop]\n").unwrap();
        let result = load_packages_config(dir.path());
        assert!(matches!(result, Err(Error::Config(ConfigError::Yaml { .. }))));
    }

    #[test]
    fn test_invalid_structure_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("openwrt.yml"),
            "targets:\n  - {name: x86, subtarget: \"\"}\n",
        )
        .unwrap();
        let result = load_openwrt_config(dir.path());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
