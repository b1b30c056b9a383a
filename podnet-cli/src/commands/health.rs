use anyhow::Result;
use nix::unistd::{AccessFlags, access};
use std::path::Path;

use podnet_cni::CniConfig;

use crate::cli::HealthArgs;
use crate::commands::load_cni_config;

/// Execute health check command
pub async fn execute(args: &HealthArgs) -> Result<()> {
    println!("\nPodnet Health Check\n");
    println!("{:-<60}", "");

    let config = load_cni_config(&args.manager).await?;

    let mut failures = 0;
    failures += usize::from(!check_dir("plugin binary directory", &config.bin_dir, true));
    failures += usize::from(!check_dir("plugin configuration directory", &config.conf_dir, false));
    failures += usize::from(!check_netns(&args.manager.netns));
    failures += usize::from(!check_counts(&config));
    check_privileges();

    println!("{:-<60}", "");

    if failures > 0 {
        anyhow::bail!("{failures} check(s) failed");
    }

    println!("\nAll checks passed\n");
    Ok(())
}

fn check_dir(kind: &str, path: &Path, executable: bool) -> bool {
    print!("Checking {kind} {}... ", path.display());

    if !path.is_dir() {
        println!("NOT FOUND");
        return false;
    }

    let mode = if executable {
        AccessFlags::R_OK | AccessFlags::X_OK
    } else {
        AccessFlags::R_OK
    };

    match access(path, mode) {
        Ok(()) => {
            println!("OK");
            true
        }
        Err(e) => {
            println!("NO ACCESS ({e})");
            false
        }
    }
}

fn check_netns(path: &Path) -> bool {
    print!("Checking network namespace {}... ", path.display());

    if path.exists() {
        println!("OK");
        true
    } else {
        println!("NOT FOUND");
        println!("   Create one with: ip netns add <name>");
        false
    }
}

fn check_counts(config: &CniConfig) -> bool {
    print!("Checking network counts... ");

    match config.validate() {
        Ok(()) => {
            println!("OK");
            true
        }
        Err(e) => {
            println!("INVALID ({e})");
            false
        }
    }
}

/// Attaching real plugins needs root, the checks above do not
fn check_privileges() {
    print!("Checking privileges... ");

    if nix::unistd::geteuid().is_root() {
        println!("OK (root)");
    } else {
        println!("LIMITED (not root)");
    }
}
