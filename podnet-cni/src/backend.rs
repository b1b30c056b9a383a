//! Network manager trait for pluggable implementations

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use podnet_core::{Result, SandboxId};
use podnet_options::AttachmentOptions;

use crate::result::AttachmentResult;

/// Attaches and detaches sandbox networks
///
/// Implementations own plugin discovery and invocation:
/// - [`MockNetwork`](crate::MockNetwork) - in-process bookkeeping, no plugins
/// - Future: a plugin-executing manager
///
/// Initialization is a constructor on the concrete type, so a value of this
/// trait is always a ready handle.
///
/// # Cancellation
/// `cancel` is handed through unmodified. A cancelled call returns
/// [`Error::Cancelled`](podnet_core::Error::Cancelled) and is never retried.
#[async_trait]
pub trait NetworkManager: Send + Sync {
    /// Set up the sandbox networks inside `netns`
    ///
    /// # Errors
    /// Returns error if any plugin fails, the namespace is missing or the call
    /// is cancelled
    async fn attach(
        &self,
        id: &SandboxId,
        netns: &Path,
        options: &AttachmentOptions,
        cancel: &CancellationToken,
    ) -> Result<AttachmentResult>;

    /// Tear down the sandbox networks inside `netns`
    ///
    /// # Errors
    /// Returns error if any plugin fails or the call is cancelled
    async fn detach(
        &self,
        id: &SandboxId,
        netns: &Path,
        options: &AttachmentOptions,
        cancel: &CancellationToken,
    ) -> Result<()>;
}
