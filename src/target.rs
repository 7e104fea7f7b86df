// src/target.rs

//! Build targets and policy scopes
//!
//! A target identifies an OpenWrt build platform by `name` and `subtarget`
//! (for example `x86` / `64`). Package policies are keyed by scope: the
//! literal `all` for every target, or `<name>_<subtarget>` for one platform.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Scope key applying to every target
pub const GLOBAL_SCOPE: &str = "all";

/// An OpenWrt build platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub subtarget: String,
    #[serde(default)]
    pub description: String,
}

impl Target {
    pub fn new(name: impl Into<String>, subtarget: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtarget: subtarget.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Policy scope key for this target
    pub fn scope_key(&self) -> Result<String> {
        scope_key(&self.name, &self.subtarget)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.subtarget)
    }
}

/// Build the `<target>_<subtarget>` scope key
///
/// Both components must be non-empty; a blank component would silently
/// select the wrong (or no) target-specific policy.
pub fn scope_key(target: &str, subtarget: &str) -> Result<String> {
    if target.trim().is_empty() {
        return Err(Error::Configuration("target must not be empty".to_string()));
    }
    if subtarget.trim().is_empty() {
        return Err(Error::Configuration(format!(
            "subtarget for target '{}' must not be empty",
            target
        )));
    }
    Ok(format!("{}_{}", target, subtarget))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_key() {
        assert_eq!(scope_key("x86", "64").unwrap(), "x86_64");
        assert_eq!(scope_key("ramips", "mt7621").unwrap(), "ramips_mt7621");
    }

    #[test]
    fn test_scope_key_rejects_empty_components() {
        assert!(matches!(scope_key("", "64"), Err(Error::Configuration(_))));
        assert!(matches!(scope_key("x86", ""), Err(Error::Configuration(_))));
        assert!(matches!(scope_key("x86", "  "), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_target_display() {
        let target = Target::new("x86", "64").with_description("Generic PC");
        assert_eq!(target.to_string(), "x86/64");
        assert_eq!(target.scope_key().unwrap(), "x86_64");
    }
}
