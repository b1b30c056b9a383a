//! Sandbox network attachment driver
//!
//! One call sequence per sandbox:
//! 1. Build the attachment options (fails before any manager call)
//! 2. Attach through the network manager
//! 3. In dry-run mode, detach again with the same options

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use podnet_core::{NetworkEvent, Result, SandboxConfig, SandboxId};
use podnet_options::{AttachmentOptions, build_attachment_options};

use crate::backend::NetworkManager;
use crate::result::AttachmentResult;

/// Everything needed to attach one sandbox
#[derive(Debug, Clone)]
pub struct SandboxNetworkRequest {
    /// Sandbox ID
    pub id: SandboxId,
    /// Network namespace path
    pub netns: PathBuf,
    /// Sandbox configuration
    pub config: SandboxConfig,
    /// Detach right after attaching
    pub dry_run: bool,
}

impl SandboxNetworkRequest {
    /// Create a request that keeps the network attached
    #[must_use]
    pub fn new(id: SandboxId, netns: impl Into<PathBuf>, config: SandboxConfig) -> Self {
        Self {
            id,
            netns: netns.into(),
            config,
            dry_run: false,
        }
    }

    /// Detach right after attaching
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Build the attachment options for this request
    pub fn options(&self) -> Result<AttachmentOptions> {
        build_attachment_options(self.id.as_str(), &self.config)
    }
}

/// Drives attach and detach against a network manager
pub struct SandboxNetwork {
    manager: Arc<dyn NetworkManager>,
    events: Option<mpsc::Sender<NetworkEvent>>,
}

impl SandboxNetwork {
    /// Create a driver for `manager`
    #[must_use]
    pub fn new(manager: Arc<dyn NetworkManager>) -> Self {
        Self {
            manager,
            events: None,
        }
    }

    /// Enable event notifications
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::Sender<NetworkEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Attach the sandbox network, detaching again in dry-run mode
    ///
    /// In dry-run mode the detach also runs after a failed attach. The attach
    /// error then takes precedence and a detach failure is only logged.
    ///
    /// # Errors
    /// Returns the option building, attach or detach error unchanged
    pub async fn setup(
        &self,
        request: &SandboxNetworkRequest,
        cancel: &CancellationToken,
    ) -> Result<AttachmentResult> {
        let options = request.options()?;
        debug!(
            sandbox_id = %request.id,
            cni_args = %options.cni_args(),
            "Attachment options ready"
        );

        self.emit(NetworkEvent::AttachStarted {
            id: request.id.clone(),
            netns: request.netns.clone(),
            options: options.len(),
            timestamp: SystemTime::now(),
        })
        .await;

        let attached = self
            .manager
            .attach(&request.id, &request.netns, &options, cancel)
            .await;

        match &attached {
            Ok(result) => {
                self.emit(NetworkEvent::Attached {
                    id: request.id.clone(),
                    interfaces: result.interface_names(),
                    timestamp: SystemTime::now(),
                })
                .await;
            }
            Err(e) => self.emit_failure(&request.id, "attach", e).await,
        }

        if !request.dry_run {
            return attached;
        }

        info!(sandbox_id = %request.id, "Dry run, detaching sandbox network");
        let detached = self.detach_with(request, &options, cancel).await;

        match (attached, detached) {
            (Ok(result), Ok(())) => Ok(result),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(detach_error)) => {
                error!(
                    sandbox_id = %request.id,
                    error = %detach_error,
                    "Cleanup detach failed after failed attach"
                );
                Err(e)
            }
        }
    }

    /// Detach the sandbox network
    ///
    /// # Errors
    /// Returns the option building or detach error unchanged
    pub async fn teardown(
        &self,
        request: &SandboxNetworkRequest,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let options = request.options()?;
        self.detach_with(request, &options, cancel).await
    }

    async fn detach_with(
        &self,
        request: &SandboxNetworkRequest,
        options: &AttachmentOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let detached = self
            .manager
            .detach(&request.id, &request.netns, options, cancel)
            .await;

        match &detached {
            Ok(()) => {
                self.emit(NetworkEvent::Detached {
                    id: request.id.clone(),
                    timestamp: SystemTime::now(),
                })
                .await;
            }
            Err(e) => self.emit_failure(&request.id, "detach", e).await,
        }

        detached
    }

    async fn emit_failure(&self, id: &SandboxId, operation: &str, error: &podnet_core::Error) {
        self.emit(NetworkEvent::Failed {
            id: id.clone(),
            operation: operation.to_string(),
            message: error.to_string(),
            timestamp: SystemTime::now(),
        })
        .await;
    }

    async fn emit(&self, event: NetworkEvent) {
        event.emit_trace();

        if let Some(ref tx) = self.events {
            if tx.send(event).await.is_err() {
                debug!("Event receiver dropped");
            }
        }
    }
}

impl std::fmt::Debug for SandboxNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxNetwork")
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}
