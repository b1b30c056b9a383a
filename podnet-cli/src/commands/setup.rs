//! Sandbox network setup

use anyhow::{Context, Result};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use podnet_cni::{CancellationToken, MockNetwork, SandboxNetwork, SandboxNetworkRequest};

use crate::cli::SetupArgs;
use crate::commands::{load_cni_config, load_sandbox};

pub async fn execute(args: SetupArgs) -> Result<()> {
    let (id, sandbox) = load_sandbox(&args.sandbox).await?;
    let request = SandboxNetworkRequest::new(id, &args.manager.netns, sandbox)
        .with_dry_run(args.dry_run);

    // Bad annotations fail before the manager is touched
    let options = request
        .options()
        .context("Failed to build attachment options")?;
    debug!(options = options.len(), "Attachment options validated");

    let config = load_cni_config(&args.manager).await?;
    info!(
        bin_dir = %config.bin_dir.display(),
        conf_dir = %config.conf_dir.display(),
        max_conf_num = config.max_conf_num,
        "Initializing network manager"
    );
    let manager = MockNetwork::initialize(config)
        .await
        .context("Failed to initialize network manager")?;

    let cancel = CancellationToken::new();
    let watcher = spawn_cancel_watcher(cancel.clone(), args.timeout.map(Duration::from_secs));

    info!(
        sandbox_id = %request.id,
        netns = %request.netns.display(),
        dry_run = request.dry_run,
        "Setting up sandbox network"
    );
    let driver = SandboxNetwork::new(Arc::new(manager));
    let result = driver.setup(&request, &cancel).await;
    watcher.abort();

    let result = result.context("Failed to set up sandbox network")?;
    let json = serde_json::to_string_pretty(&result).context("Failed to render result")?;
    println!("{json}");

    Ok(())
}

/// Cancel `token` on Ctrl+C or once `timeout` elapses
fn spawn_cancel_watcher(token: CancellationToken, timeout: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(watch_cancel(token, timeout, tokio::signal::ctrl_c()))
}

/// Cancel `token` when `interrupt` fires or `timeout` elapses
///
/// A failing `interrupt` leaves the timeout in charge.
async fn watch_cancel<F>(token: CancellationToken, timeout: Option<Duration>, interrupt: F)
where
    F: Future<Output = io::Result<()>>,
{
    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    tokio::select! {
        result = interrupt => match result {
            Ok(()) => info!("Received Ctrl+C, cancelling"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                (&mut deadline).await;
                warn!(?timeout, "Timeout elapsed, cancelling");
            }
        },
        () = &mut deadline => warn!(?timeout, "Timeout elapsed, cancelling"),
    }

    token.cancel();
}
