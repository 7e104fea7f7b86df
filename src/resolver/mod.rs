// src/resolver/mod.rs

//! Package directive resolution
//!
//! Merges every source of package decisions for one target into a single
//! ordered list of enable/disable directives. Sources are applied in a
//! fixed order:
//!
//! 1. Base packages from `openwrt.yml`
//! 2. `include_packages.all`
//! 3. `include_packages.<target>_<subtarget>`
//! 4. Packages of each enabled repository, in repository order
//! 5. `exclude_packages.all`, then `exclude_packages.<target>_<subtarget>`
//!
//! Includes append a name the first time it is seen and never move it.
//! Excludes run last and always win: they disable an existing directive in
//! place, or append a disabled one for a name nothing included.
//!
//! The output order is stable so rendered `.config` files diff cleanly
//! between builds.

mod name;

pub use name::{NameViolation, validate_package_name};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::feed::RepositoryDefinition;
use crate::policy::PackagePolicy;
use crate::target::{GLOBAL_SCOPE, scope_key};

/// Where a directive's current state came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveSource {
    Base,
    GlobalInclude,
    TargetInclude,
    Repository(String),
    GlobalExclude,
    TargetExclude,
}

impl fmt::Display for DirectiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base packages"),
            Self::GlobalInclude => write!(f, "include_packages.{}", GLOBAL_SCOPE),
            Self::TargetInclude => write!(f, "target include_packages"),
            Self::Repository(name) => write!(f, "repository {}", name),
            Self::GlobalExclude => write!(f, "exclude_packages.{}", GLOBAL_SCOPE),
            Self::TargetExclude => write!(f, "target exclude_packages"),
        }
    }
}

/// Enable/disable decision for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDirective {
    pub name: String,
    pub enabled: bool,
    pub source: DirectiveSource,
}

/// Ordered, de-duplicated directives for one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageDirectiveSet {
    directives: Vec<PackageDirective>,
}

impl PackageDirectiveSet {
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageDirective> {
        self.directives.iter()
    }

    pub fn as_slice(&self) -> &[PackageDirective] {
        &self.directives
    }

    pub fn get(&self, name: &str) -> Option<&PackageDirective> {
        self.directives.iter().find(|d| d.name == name)
    }

    /// `Some(enabled)` for a known package, `None` otherwise
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.get(name).map(|d| d.enabled)
    }

    /// Names of enabled packages, in directive order
    pub fn enabled(&self) -> Vec<&str> {
        self.names_where(true)
    }

    /// Names of disabled packages, in directive order
    pub fn disabled(&self) -> Vec<&str> {
        self.names_where(false)
    }

    /// `(name, enabled)` pairs in order
    pub fn pairs(&self) -> Vec<(&str, bool)> {
        self.directives
            .iter()
            .map(|d| (d.name.as_str(), d.enabled))
            .collect()
    }

    fn names_where(&self, enabled: bool) -> Vec<&str> {
        self.directives
            .iter()
            .filter(|d| d.enabled == enabled)
            .map(|d| d.name.as_str())
            .collect()
    }
}

impl<'a> IntoIterator for &'a PackageDirectiveSet {
    type Item = &'a PackageDirective;
    type IntoIter = std::slice::Iter<'a, PackageDirective>;

    fn into_iter(self) -> Self::IntoIter {
        self.directives.iter()
    }
}

/// A package name that was dropped because it failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedPackage {
    pub name: String,
    pub source: DirectiveSource,
    pub reason: NameViolation,
}

impl fmt::Display for RejectedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} from {}: {}", self.name, self.source, self.reason)
    }
}

/// Result of directive resolution
///
/// Rejected names are warnings: `directives` holds everything that was
/// valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub directives: PackageDirectiveSet,
    pub rejected: Vec<RejectedPackage>,
}

impl Resolution {
    /// True when no package name was rejected
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Accumulates directives while keeping first-seen order
#[derive(Default)]
struct DirectiveBuilder {
    directives: Vec<PackageDirective>,
    index: HashMap<String, usize>,
    rejected: Vec<RejectedPackage>,
}

impl DirectiveBuilder {
    fn accept(&mut self, name: &str, source: &DirectiveSource) -> bool {
        match validate_package_name(name) {
            Ok(()) => true,
            Err(reason) => {
                warn!("Rejected package name {:?} from {}: {}", name, source, reason);
                self.rejected.push(RejectedPackage {
                    name: name.to_string(),
                    source: source.clone(),
                    reason,
                });
                false
            }
        }
    }

    fn include<'a, I>(&mut self, names: I, source: DirectiveSource)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for name in names {
            if !self.accept(name, &source) || self.index.contains_key(name.as_str()) {
                continue;
            }
            self.index.insert(name.clone(), self.directives.len());
            self.directives.push(PackageDirective {
                name: name.clone(),
                enabled: true,
                source: source.clone(),
            });
        }
    }

    fn exclude(&mut self, names: &[String], source: DirectiveSource) {
        for name in names {
            if !self.accept(name, &source) {
                continue;
            }
            match self.index.get(name.as_str()) {
                Some(&pos) => {
                    let directive = &mut self.directives[pos];
                    if directive.enabled {
                        debug!(
                            "Package {} included by {} is excluded by {}",
                            name, directive.source, source
                        );
                    }
                    directive.enabled = false;
                    directive.source = source.clone();
                }
                None => {
                    self.index.insert(name.clone(), self.directives.len());
                    self.directives.push(PackageDirective {
                        name: name.clone(),
                        enabled: false,
                        source: source.clone(),
                    });
                }
            }
        }
    }

    fn finish(self) -> Resolution {
        Resolution {
            directives: PackageDirectiveSet {
                directives: self.directives,
            },
            rejected: self.rejected,
        }
    }
}

/// Resolve the package directives for `target`/`subtarget`
///
/// Fails only on configuration errors (blank target or subtarget, blank
/// policy scopes). Invalid package names are collected in
/// [`Resolution::rejected`] while every valid name still resolves.
pub fn resolve(
    target: &str,
    subtarget: &str,
    base_packages: &[String],
    policy: &PackagePolicy,
    repositories: &[RepositoryDefinition],
) -> Result<Resolution> {
    let scope = scope_key(target, subtarget)?;
    policy.validate()?;

    let mut builder = DirectiveBuilder::default();
    builder.include(base_packages, DirectiveSource::Base);
    builder.include(policy.global_includes(), DirectiveSource::GlobalInclude);
    builder.include(policy.includes(&scope), DirectiveSource::TargetInclude);

    for repo in repositories {
        if !repo.enabled {
            debug!("Repository {} is disabled, ignoring its packages", repo.name);
            continue;
        }
        builder.include(&repo.packages, DirectiveSource::Repository(repo.name.clone()));
    }

    builder.exclude(policy.global_excludes(), DirectiveSource::GlobalExclude);
    builder.exclude(policy.excludes(&scope), DirectiveSource::TargetExclude);

    let resolution = builder.finish();
    info!(
        "Resolved {} package directives for {} ({} enabled, {} disabled, {} rejected)",
        resolution.directives.len(),
        scope,
        resolution.directives.enabled().len(),
        resolution.directives.disabled().len(),
        resolution.rejected.len()
    );
    Ok(resolution)
}
