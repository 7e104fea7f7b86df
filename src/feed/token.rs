// src/feed/token.rs

//! Repository access token

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Secret used to authenticate against a private package feed
///
/// The value is only reachable through [`AuthToken::expose`]; `Debug` and
/// `Display` print a mask, and the type does not implement `Serialize`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token; blank input yields `None`
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Raw token value, for building an authenticated feed URL
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Deserialize an optional token, treating blank strings as absent
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<AuthToken>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(AuthToken::new))
}
