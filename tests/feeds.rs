// tests/feeds.rs

//! Feed registration and credential hygiene.

mod common;

use wrtforge::render::{render_feeds, render_feeds_redacted};
use wrtforge::{ConfigSet, RepositoryDefinition, redact, register_feeds};

#[test]
fn test_feed_lines_from_config() {
    let dir = common::config_dir();
    let configs = ConfigSet::load(dir.path()).unwrap();
    let feeds = register_feeds(&configs.packages.repositories);

    let names: Vec<&str> = feeds.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["custom", "keys"]);
    assert_eq!(
        render_feeds(&feeds),
        "src-git custom https://ghp_topsecret@github.com/org/private-feed;openwrt-23.05\n\
         src-git keys git@github.com:org/ssh-feed.git;main\n"
    );
}

#[test]
fn test_token_never_reaches_display_surfaces() {
    let dir = common::config_dir();
    let configs = ConfigSet::load(dir.path()).unwrap();
    let repos = &configs.packages.repositories;
    let feeds = register_feeds(repos);

    let surfaces = [
        render_feeds_redacted(&feeds),
        format!("{:?}", feeds),
        format!("{:?}", repos),
        serde_json::to_string(repos).unwrap(),
        serde_json::to_string(&redact(repos)).unwrap(),
        serde_yaml::to_string(&redact(repos)).unwrap(),
    ];
    for surface in &surfaces {
        assert!(!surface.contains(common::SECRET), "token leaked into {}", surface);
    }
}

#[test]
fn test_redact_preserves_everything_else() {
    let dir = common::config_dir();
    let configs = ConfigSet::load(dir.path()).unwrap();
    let repos = &configs.packages.repositories;
    let redacted = redact(repos);

    assert_eq!(redacted.len(), repos.len());
    for (original, clean) in repos.iter().zip(&redacted) {
        assert!(clean.auth_token.is_none());
        assert_eq!(clean.name, original.name);
        assert_eq!(clean.url, original.url);
        assert_eq!(clean.branch, original.branch);
        assert_eq!(clean.enabled, original.enabled);
        assert_eq!(clean.packages, original.packages);
    }
    // The source list is untouched
    assert!(repos[0].auth_token.is_some());
}

#[test]
fn test_registration_order_and_enablement() {
    let repos = vec![
        RepositoryDefinition::new("b", "https://example.com/b"),
        RepositoryDefinition::new("off", "https://example.com/off").with_enabled(false),
        RepositoryDefinition::new("a", "https://example.com/a").with_token("T"),
    ];
    let feeds = register_feeds(&repos);
    assert_eq!(feeds.len(), 2);
    assert_eq!(feeds[0].render(), "src-git b https://example.com/b;main");
    assert_eq!(feeds[1].render(), "src-git a https://T@example.com/a;main");
}
