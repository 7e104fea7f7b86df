// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: configuration directory
fn config_dir_arg() -> Arg {
    Arg::new("config_dir")
        .short('c')
        .long("config-dir")
        .value_name("DIR")
        .default_value("config")
        .help("Configuration directory")
}

/// Common argument: target platform
fn target_arg() -> Arg {
    Arg::new("target")
        .short('t')
        .long("target")
        .required(true)
        .help("Target platform, e.g. x86")
}

/// Common argument: subtarget
fn subtarget_arg() -> Arg {
    Arg::new("subtarget")
        .short('s')
        .long("subtarget")
        .required(true)
        .help("Subtarget, e.g. 64")
}

fn build_cli() -> Command {
    Command::new("wrtforge")
        .version(env!("CARGO_PKG_VERSION"))
        .author("wrtforge contributors")
        .about("OpenWrt firmware build configurator")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (RUST_LOG takes precedence)"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Show the package directives for a target")
                .arg(config_dir_arg())
                .arg(target_arg())
                .arg(subtarget_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the resolution as JSON"),
                ),
        )
        .subcommand(
            Command::new("feeds")
                .about("Show feed registrations with credentials masked")
                .arg(config_dir_arg()),
        )
        .subcommand(
            Command::new("version")
                .about("Derive the firmware version")
                .arg(Arg::new("repo").long("repo").default_value(".").help("Git checkout to read tags and commits from"))
                .arg(Arg::new("tag").long("tag").help("Use this tag instead of reading history from --repo"))
                .arg(Arg::new("commits").long("commits").default_value("0").help("Commits since the tag (with --tag)"))
                .arg(Arg::new("sha").long("sha").help("Short commit hash (with --tag)"))
                .arg(Arg::new("date").long("date").help("Build date as YYYY-MM-DD (default: today, UTC)")),
        )
        .subcommand(
            Command::new("build")
                .about("Configure an OpenWrt checkout and build firmware")
                .arg(config_dir_arg())
                .arg(target_arg())
                .arg(subtarget_arg())
                .arg(Arg::new("work_dir").short('w').long("work-dir").required(true).help("OpenWrt checkout to build in"))
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .default_value("output")
                        .help("Directory receiving versioned artifact directories"),
                )
                .arg(Arg::new("openwrt_version").long("openwrt-version").help("OpenWrt release tag checked out in the work dir"))
                .arg(Arg::new("firmware_version").long("firmware-version").help("Firmware version"))
                .arg(Arg::new("repo").long("repo").default_value(".").help("Git checkout the firmware version is derived from"))
                .arg(Arg::new("timeout").long("timeout").help("Abort the build after this many seconds")),
        )
        .subcommand(
            Command::new("release")
                .about("Write checksums, release notes and manifest for built firmware")
                .arg(config_dir_arg())
                .arg(Arg::new("release_version").long("release-version").required(true).help("Release version"))
                .arg(
                    Arg::new("artifacts_dir")
                        .short('a')
                        .long("artifacts-dir")
                        .required(true)
                        .help("Directory containing build artifacts"),
                ),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Print the redacted build configuration as JSON")
                .arg(config_dir_arg())
                .arg(target_arg())
                .arg(subtarget_arg())
                .arg(
                    Arg::new("firmware_version")
                        .long("firmware-version")
                        .default_value("0.1.0")
                        .help("Firmware version recorded in the snapshot"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("wrtforge.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
