// src/policy.rs

//! Scoped package include/exclude policy
//!
//! Policies come from `packages.yml`:
//!
//! ```yaml
//! include_packages:
//!   all: [htop, tcpdump]
//!   x86_64: [wireguard-tools]
//! exclude_packages:
//!   all: [ppp]
//! ```
//!
//! Each scope maps to an ordered list. The same name may appear under both
//! an include and an exclude scope; [`crate::resolver::resolve`] settles
//! that (exclusion wins).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::target::GLOBAL_SCOPE;

/// Include and exclude lists keyed by scope (`all` or `<target>_<subtarget>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePolicy {
    #[serde(rename = "include_packages", default)]
    pub include: HashMap<String, Vec<String>>,

    #[serde(rename = "exclude_packages", default)]
    pub exclude: HashMap<String, Vec<String>>,
}

impl PackagePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add packages to a scope's include list
    pub fn with_include<I, S>(mut self, scope: &str, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include
            .entry(scope.to_string())
            .or_default()
            .extend(packages.into_iter().map(Into::into));
        self
    }

    /// Add packages to a scope's exclude list
    pub fn with_exclude<I, S>(mut self, scope: &str, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude
            .entry(scope.to_string())
            .or_default()
            .extend(packages.into_iter().map(Into::into));
        self
    }

    /// Include list for a scope (empty when the scope is not declared)
    pub fn includes(&self, scope: &str) -> &[String] {
        self.include.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Exclude list for a scope (empty when the scope is not declared)
    pub fn excludes(&self, scope: &str) -> &[String] {
        self.exclude.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn global_includes(&self) -> &[String] {
        self.includes(GLOBAL_SCOPE)
    }

    pub fn global_excludes(&self) -> &[String] {
        self.excludes(GLOBAL_SCOPE)
    }

    /// Check the policy structure
    ///
    /// Scope keys must be non-blank. Package names are not checked here;
    /// the resolver rejects bad names individually.
    pub fn validate(&self) -> Result<()> {
        for (kind, map) in [("include_packages", &self.include), ("exclude_packages", &self.exclude)] {
            if let Some(scope) = map.keys().find(|scope| scope.trim().is_empty()) {
                return Err(Error::Configuration(format!(
                    "{} contains a blank scope key {:?}",
                    kind, scope
                )));
            }
        }
        Ok(())
    }
}
