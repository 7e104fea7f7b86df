// src/render.rs

//! Rendering of resolved decisions into OpenWrt configuration text
//!
//! Pure string builders; writing the text to disk is the build driver's
//! job.

use crate::feed::FeedLine;
use crate::resolver::{PackageDirective, PackageDirectiveSet};
use crate::target::Target;

/// Target selection symbols for `.config`
pub fn target_lines(target: &Target) -> Vec<String> {
    vec![
        format!("CONFIG_TARGET_{}=y", target.name),
        format!("CONFIG_TARGET_{}_{}=y", target.name, target.subtarget),
    ]
}

/// `.config` line for one directive
pub fn directive_line(directive: &PackageDirective) -> String {
    if directive.enabled {
        format!("CONFIG_PACKAGE_{}=y", directive.name)
    } else {
        format!("# CONFIG_PACKAGE_{} is not set", directive.name)
    }
}

/// Directive lines in directive order
pub fn directive_lines(directives: &PackageDirectiveSet) -> Vec<String> {
    directives.iter().map(directive_line).collect()
}

/// `CONFIG_VERSION_*` lines labelling the image with the firmware version
pub fn version_lines(version: &str) -> Vec<String> {
    vec![
        format!("CONFIG_VERSION_NUMBER=\"{}\"", version),
        format!("CONFIG_VERSION_CODE=\"{}\"", version),
    ]
}

/// `.config` fragment: kernel options, package directives, version
///
/// The fragment is appended to the output of `make defconfig` for the
/// target; a second `make defconfig` then normalizes the result.
pub fn render_config_fragment(
    kernel_config: &[String],
    directives: &PackageDirectiveSet,
    version: &str,
) -> String {
    let mut out = String::new();
    for option in kernel_config.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
        out.push_str(option);
        out.push('\n');
    }
    for line in directive_lines(directives).into_iter().chain(version_lines(version)) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Complete `.config` seed for a target, ready for `make defconfig`
pub fn render_config(
    target: &Target,
    kernel_config: &[String],
    directives: &PackageDirectiveSet,
    version: &str,
) -> String {
    let mut out: String = target_lines(target).iter().map(|l| format!("{}\n", l)).collect();
    out.push_str(&render_config_fragment(kernel_config, directives, version));
    out
}

/// `feeds.conf` lines including credentials
pub fn render_feeds(feeds: &[FeedLine]) -> String {
    feeds.iter().map(|f| format!("{}\n", f.render())).collect()
}

/// `feeds.conf` lines with credentials masked, for display
pub fn render_feeds_redacted(feeds: &[FeedLine]) -> String {
    feeds.iter().map(|f| format!("{}\n", f)).collect()
}
