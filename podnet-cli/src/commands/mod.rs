use anyhow::{Context, Result};
use std::path::Path;

use podnet_cni::CniConfig;
use podnet_core::{DnsConfig, PortMapping, SandboxConfig, SandboxId};

use crate::cli::{Commands, ManagerArgs, SandboxArgs};

pub mod health;
pub mod options;
pub mod setup;
pub mod version;

/// Dispatch command to appropriate handler
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Setup(args) => setup::execute(args).await,
        Commands::Options(args) => options::execute(&args).await,
        Commands::Health(args) => health::execute(&args).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Sandbox used when no configuration file is given
pub fn demo_sandbox() -> SandboxConfig {
    SandboxConfig::new()
        .with_metadata("pod", "xid-123", "default")
        .with_hostname("mynode")
        .with_dns_config(DnsConfig::default())
        .with_port_mapping(PortMapping::tcp(80, 18080))
        .with_annotation("kubernetes.io/ingress-bandwidth", "200Mi")
        .with_annotation("kubernetes.io/egress-bandwidth", "100Mi")
}

/// Resolve the sandbox ID and configuration from the arguments
pub async fn load_sandbox(args: &SandboxArgs) -> Result<(SandboxId, SandboxConfig)> {
    let id = SandboxId::new(&args.id).context("Invalid sandbox ID")?;

    let config = match &args.sandbox {
        Some(path) => read_sandbox(path).await?,
        None => demo_sandbox(),
    };

    Ok((id, config))
}

async fn read_sandbox(path: &Path) -> Result<SandboxConfig> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read sandbox config {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid sandbox config {}", path.display()))
}

/// Build the manager configuration: file values first, then flags
pub async fn load_cni_config(args: &ManagerArgs) -> Result<CniConfig> {
    let mut config = match &args.cni_config {
        Some(path) => CniConfig::from_file(path)
            .await
            .context("Failed to load network manager configuration")?,
        None => CniConfig::new(),
    };

    if let Some(dir) = &args.bin_dir {
        config = config.with_bin_dir(dir);
    }
    if let Some(dir) = &args.conf_dir {
        config = config.with_conf_dir(dir);
    }
    if let Some(max) = args.max_conf_num {
        config = config.with_max_conf_num(max);
    }

    Ok(config)
}
