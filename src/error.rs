// src/error.rs

//! Crate-wide error type

use std::path::PathBuf;
use thiserror::Error;

use crate::build::ToolchainError;
use crate::config::ConfigError;

/// Errors surfaced by wrtforge operations
///
/// Per-entry package name problems are not errors: they are reported as
/// [`crate::resolver::RejectedPackage`] alongside a resolved directive set.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing scope identifiers or malformed policy structure
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Target {0} is not defined in the OpenWrt configuration")]
    UnknownTarget(String),

    #[error("Version control query failed: {0}")]
    History(String),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("Build artifacts not found at {0}")]
    ArtifactsMissing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for wrtforge operations
pub type Result<T> = std::result::Result<T, Error>;
