//! CLI argument definitions

use clap::{ArgAction, Args, Parser, Subcommand};
use std::convert::Infallible;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "podnet")]
#[command(about = "Attach pod sandbox networks through CNI plugins", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Attach the sandbox network and print the result
    Setup(SetupArgs),

    /// Print the attachment options built for a sandbox
    Options(SandboxArgs),

    /// Check plugin directories and the network namespace
    Health(HealthArgs),

    /// Show version information
    Version,
}

/// Sandbox selection shared by the commands that build options
#[derive(Args, Debug, Clone)]
pub struct SandboxArgs {
    /// Sandbox ID
    #[arg(short, long, default_value = "sandbox_id")]
    pub id: String,

    /// Sandbox configuration JSON file (built-in demo sandbox if omitted)
    #[arg(long)]
    pub sandbox: Option<PathBuf>,
}

/// Plugin manager locations
#[derive(Args, Debug, Clone)]
pub struct ManagerArgs {
    /// Plugin binary directory
    #[arg(long, env = "CNI_BIN")]
    pub bin_dir: Option<PathBuf>,

    /// Plugin configuration directory
    #[arg(long, env = "CNI_CONF")]
    pub conf_dir: Option<PathBuf>,

    /// Maximum number of configuration files to load (0 = all)
    #[arg(long, env = "CNI_MAX_CONF_NUM")]
    pub max_conf_num: Option<usize>,

    /// Manager configuration JSON file; flags override its values
    #[arg(long)]
    pub cni_config: Option<PathBuf>,

    /// Network namespace path
    #[arg(long, env = "CNI_NETNS", default_value = "/var/run/netns/zenx")]
    pub netns: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SetupArgs {
    #[command(flatten)]
    pub sandbox: SandboxArgs,

    #[command(flatten)]
    pub manager: ManagerArgs,

    /// Detach again after attaching (only "false" disables it)
    #[arg(
        long,
        env = "DRYRUN",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        value_parser = parse_dry_run
    )]
    pub dry_run: bool,

    /// Cancel the operation after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct HealthArgs {
    #[command(flatten)]
    pub manager: ManagerArgs,
}

#[allow(clippy::unnecessary_wraps)]
fn parse_dry_run(value: &str) -> Result<bool, Infallible> {
    Ok(value != "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dry_run_only_disabled_by_false() {
        assert!(!parse_dry_run("false").unwrap());
        assert!(parse_dry_run("true").unwrap());
        assert!(parse_dry_run("0").unwrap());
        assert!(parse_dry_run("FALSE").unwrap());
    }

    #[test]
    fn test_setup_flags() {
        let cli = Cli::try_parse_from([
            "podnet",
            "setup",
            "--id",
            "abc",
            "--netns",
            "/run/netns/test",
            "--dry-run",
            "false",
            "--timeout",
            "5",
        ])
        .unwrap();

        let Commands::Setup(args) = cli.command else {
            panic!("expected setup");
        };
        assert_eq!(args.sandbox.id, "abc");
        assert_eq!(args.manager.netns, PathBuf::from("/run/netns/test"));
        assert!(!args.dry_run);
        assert_eq!(args.timeout, Some(5));
    }
}
