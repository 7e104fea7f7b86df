// src/resolver/name.rs

//! Package name validation
//!
//! Names end up inside `.config` symbols (`CONFIG_PACKAGE_<name>`), so only
//! a conservative character set is accepted: ASCII letters and digits plus
//! `-`, `_`, `.` and `+`, starting with a letter or digit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest package name accepted
pub const MAX_NAME_LEN: usize = 128;

/// Why a package name was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameViolation {
    Empty,
    TooLong(usize),
    InvalidStart(char),
    InvalidChar(char),
}

impl fmt::Display for NameViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name is empty"),
            Self::TooLong(len) => {
                write!(f, "name is {} characters long (max {})", len, MAX_NAME_LEN)
            }
            Self::InvalidStart(c) => {
                write!(f, "name must start with a letter or digit, found {:?}", c)
            }
            Self::InvalidChar(c) => write!(f, "name contains invalid character {:?}", c),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

/// Check a package name against the accepted identifier set
pub fn validate_package_name(name: &str) -> Result<(), NameViolation> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(NameViolation::Empty)?;

    if name.len() > MAX_NAME_LEN {
        return Err(NameViolation::TooLong(name.len()));
    }
    if !first.is_ascii_alphanumeric() {
        return Err(NameViolation::InvalidStart(first));
    }
    match chars.find(|c| !is_name_char(*c)) {
        Some(c) => Err(NameViolation::InvalidChar(c)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_openwrt_names() {
        for name in [
            "luci",
            "kmod-wireguard",
            "luci-app-firewall",
            "ip6tables-mod-nat",
            "6in4",
            "libstdcpp6",
            "python3.11",
            "ca_certificates",
            "g++",
        ] {
            assert_eq!(validate_package_name(name), Ok(()), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(validate_package_name(""), Err(NameViolation::Empty));
        assert_eq!(validate_package_name("-luci"), Err(NameViolation::InvalidStart('-')));
        assert_eq!(validate_package_name(" luci"), Err(NameViolation::InvalidStart(' ')));
        assert_eq!(validate_package_name("lu ci"), Err(NameViolation::InvalidChar(' ')));
        assert_eq!(validate_package_name("luci=y"), Err(NameViolation::InvalidChar('=')));
        assert_eq!(validate_package_name("a\nb"), Err(NameViolation::InvalidChar('\n')));
        assert_eq!(validate_package_name("paquet-é"), Err(NameViolation::InvalidChar('é')));
    }

    #[test]
    fn test_too_long() {
        let name = "a".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            validate_package_name(&name),
            Err(NameViolation::TooLong(MAX_NAME_LEN + 1))
        );
        assert!(validate_package_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
    }
}
