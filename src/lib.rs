// src/lib.rs

//! wrtforge: OpenWrt firmware build configurator
//!
//! Turns a directory of declarative configuration into the inputs an
//! OpenWrt build tree needs, and drives the build.
//!
//! # Architecture
//!
//! - Resolver: ordered, de-duplicated package directives per target,
//!   where exclusion always wins
//! - Feeds: `src-git` registrations with access tokens embedded in the
//!   transport URL and kept out of every log and snapshot
//! - Version: semantic firmware versions derived from tag/commit history
//! - Build: stage-by-stage toolchain driver with cancellation and
//!   crash-safe configuration writes
//! - Release: checksums, notes and a publish manifest for built images

pub mod build;
pub mod config;
mod error;
pub mod feed;
pub mod policy;
pub mod release;
pub mod render;
pub mod resolver;
pub mod target;
pub mod version;

pub use build::{
    BuildDriver, BuildOutcome, BuildPlan, BuildRequest, BuildSnapshot, BuildStage,
    CancellationToken, MakeToolchain, ToolchainError, ToolchainInvoker,
};
pub use config::{ConfigError, ConfigSet, OpenWrtConfig, PackagesConfig};
pub use error::{Error, Result};
pub use feed::{AuthToken, FeedLine, RepositoryDefinition, redact, register_feeds};
pub use policy::PackagePolicy;
pub use release::{ReleaseManifest, ReleasePublisher};
pub use resolver::{
    DirectiveSource, PackageDirective, PackageDirectiveSet, RejectedPackage, Resolution, resolve,
};
pub use target::Target;
pub use version::{GitHistory, RepositoryHistory, TagRef, VersionString, derive_version};
