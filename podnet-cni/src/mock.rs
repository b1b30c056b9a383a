//! In-process network manager
//!
//! Keeps attachments in memory and hands out addresses from `10.88.0.0/16`.
//! No plugin is executed; the namespace path only has to exist.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use podnet_core::{Error, Result, SandboxId};
use podnet_options::AttachmentOptions;

use crate::backend::NetworkManager;
use crate::config::CniConfig;
use crate::result::{AttachmentResult, DnsResult, InterfaceConfig, IpConfig, Route};

const POOL_PREFIX_LEN: u8 = 16;
const POOL_GATEWAY: Ipv4Addr = Ipv4Addr::new(10, 88, 0, 1);
const FIRST_HOST: u16 = 2;

/// Mock network manager (doesn't execute plugins)
///
/// # Example
/// ```
/// use podnet_cni::{CancellationToken, MockNetwork, NetworkManager};
/// use podnet_core::{SandboxConfig, SandboxId};
/// use podnet_options::build_attachment_options;
/// use std::path::Path;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let network = MockNetwork::default();
/// let id = SandboxId::new("sandbox").unwrap();
/// let options = build_attachment_options(id.as_str(), &SandboxConfig::default()).unwrap();
/// let netns = Path::new("/proc/self/ns/net");
///
/// let result = network
///     .attach(&id, netns, &options, &CancellationToken::new())
///     .await
///     .unwrap();
/// assert_eq!(result.interface_names(), vec!["eth0", "lo"]);
/// # });
/// ```
#[derive(Clone)]
pub struct MockNetwork {
    config: CniConfig,
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    attachments: HashMap<SandboxId, Attachment>,
    next_host: u16,
    call_count: usize,
    attach_failure: Option<String>,
    detach_failure: Option<String>,
    latency: Option<Duration>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            attachments: HashMap::new(),
            next_host: FIRST_HOST,
            call_count: 0,
            attach_failure: None,
            detach_failure: None,
            latency: None,
        }
    }
}

struct Attachment {
    netns: PathBuf,
    options: AttachmentOptions,
}

impl MockNetwork {
    /// Create a mock manager without checking the configuration
    #[must_use]
    pub fn new(config: CniConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a mock manager after checking counts and directories
    ///
    /// # Errors
    /// Returns [`Error::Initialization`] if the counts cannot be satisfied or
    /// either directory is missing
    pub async fn initialize(config: CniConfig) -> Result<Self> {
        config.validate()?;
        config.check_dirs().await?;

        debug!(
            bin_dir = %config.bin_dir.display(),
            conf_dir = %config.conf_dir.display(),
            max_conf_num = config.max_conf_num,
            min_network_count = config.min_network_count,
            "Mock: Initialized network manager"
        );

        Ok(Self::new(config))
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &CniConfig {
        &self.config
    }

    /// Make every following attach fail with `message`
    pub async fn fail_attach(&self, message: impl Into<String>) {
        self.state.lock().await.attach_failure = Some(message.into());
    }

    /// Make every following detach fail with `message`
    pub async fn fail_detach(&self, message: impl Into<String>) {
        self.state.lock().await.detach_failure = Some(message.into());
    }

    /// Delay every call by `latency` (cancellable)
    pub async fn set_latency(&self, latency: Duration) {
        self.state.lock().await.latency = Some(latency);
    }

    /// Get the number of manager calls made (for testing)
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.call_count
    }

    /// Check if a sandbox is attached
    pub async fn is_attached(&self, id: &SandboxId) -> bool {
        self.state.lock().await.attachments.contains_key(id)
    }

    /// Options the sandbox was attached with (for testing)
    pub async fn attachment_options(&self, id: &SandboxId) -> Option<AttachmentOptions> {
        self.state
            .lock()
            .await
            .attachments
            .get(id)
            .map(|attachment| attachment.options.clone())
    }

    /// Count the call and wait out the configured latency
    async fn begin(&self, operation: &str, id: &SandboxId, cancel: &CancellationToken) -> Result<()> {
        let latency = {
            let mut state = self.state.lock().await;
            state.call_count += 1;
            state.latency
        };

        let cancelled = || Error::Cancelled {
            operation: format!("{operation} {id}"),
        };

        if let Some(latency) = latency {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled()),
                () = tokio::time::sleep(latency) => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        Ok(())
    }

    fn build_result(
        &self,
        state: &mut MockState,
        id: &SandboxId,
        netns: &Path,
        options: &AttachmentOptions,
    ) -> Result<AttachmentResult> {
        let sandbox = netns.display().to_string();
        let mut result = AttachmentResult::default();

        result.interfaces.insert(
            "lo".to_string(),
            InterfaceConfig {
                ip_configs: vec![
                    IpConfig {
                        ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                        prefix_len: 8,
                        gateway: None,
                    },
                    IpConfig {
                        ip: IpAddr::V6(Ipv6Addr::LOCALHOST),
                        prefix_len: 128,
                        gateway: None,
                    },
                ],
                mac: "00:00:00:00:00:00".to_string(),
                sandbox: sandbox.clone(),
            },
        );

        for index in 0..self.config.min_network_count.saturating_sub(1) {
            let host = state.next_host;
            if host == u16::MAX {
                return Err(Error::Attach {
                    sandbox_id: id.to_string(),
                    message: "address pool 10.88.0.0/16 exhausted".to_string(),
                });
            }
            state.next_host += 1;

            let [high, low] = host.to_be_bytes();
            result.interfaces.insert(
                format!("eth{index}"),
                InterfaceConfig {
                    ip_configs: vec![IpConfig {
                        ip: IpAddr::V4(Ipv4Addr::new(10, 88, high, low)),
                        prefix_len: POOL_PREFIX_LEN,
                        gateway: Some(IpAddr::V4(POOL_GATEWAY)),
                    }],
                    mac: format!("0a:58:0a:58:{high:02x}:{low:02x}"),
                    sandbox: sandbox.clone(),
                },
            );
        }

        if self.config.min_network_count > 1 {
            result.routes.push(Route {
                dst: "0.0.0.0/0".to_string(),
                gw: Some(IpAddr::V4(POOL_GATEWAY)),
            });
        }

        if let Some(dns) = options.dns() {
            result.dns.push(DnsResult {
                nameservers: dns.servers.clone(),
                search: dns.searches.clone(),
                options: dns.options.clone(),
            });
        }

        Ok(result)
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new(CniConfig::default())
    }
}

impl std::fmt::Debug for MockNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockNetwork")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NetworkManager for MockNetwork {
    async fn attach(
        &self,
        id: &SandboxId,
        netns: &Path,
        options: &AttachmentOptions,
        cancel: &CancellationToken,
    ) -> Result<AttachmentResult> {
        self.begin("attach", id, cancel).await?;

        let attach_error = |message: String| Error::Attach {
            sandbox_id: id.to_string(),
            message,
        };

        if !tokio::fs::try_exists(netns).await? {
            return Err(attach_error(format!(
                "network namespace {} does not exist",
                netns.display()
            )));
        }

        let mut state = self.state.lock().await;

        if let Some(message) = state.attach_failure.clone() {
            return Err(attach_error(message));
        }

        if state.attachments.contains_key(id) {
            return Err(attach_error("sandbox network already attached".to_string()));
        }

        let result = self.build_result(&mut state, id, netns, options)?;
        state.attachments.insert(
            id.clone(),
            Attachment {
                netns: netns.to_path_buf(),
                options: options.clone(),
            },
        );

        debug!(
            sandbox_id = %id,
            netns = %netns.display(),
            interfaces = ?result.interface_names(),
            "Mock: Attached sandbox network"
        );

        Ok(result)
    }

    async fn detach(
        &self,
        id: &SandboxId,
        netns: &Path,
        _options: &AttachmentOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.begin("detach", id, cancel).await?;

        let mut state = self.state.lock().await;

        if let Some(message) = state.detach_failure.clone() {
            return Err(Error::Detach {
                sandbox_id: id.to_string(),
                message,
            });
        }

        // Detaching an unknown sandbox is not an error
        match state.attachments.remove(id) {
            Some(attachment) => debug!(
                sandbox_id = %id,
                netns = %attachment.netns.display(),
                "Mock: Detached sandbox network"
            ),
            None => debug!(
                sandbox_id = %id,
                netns = %netns.display(),
                "Mock: Nothing attached"
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podnet_core::{DnsConfig, SandboxConfig};
    use podnet_options::build_attachment_options;

    const NETNS: &str = "/proc/self/ns/net";

    fn options(id: &SandboxId, config: &SandboxConfig) -> AttachmentOptions {
        build_attachment_options(id.as_str(), config).unwrap()
    }

    #[tokio::test]
    async fn test_mock_network_lifecycle() {
        let network = MockNetwork::default();
        let id = SandboxId::new("lifecycle").unwrap();
        let opts = options(&id, &SandboxConfig::default());
        let cancel = CancellationToken::new();

        let result = network
            .attach(&id, Path::new(NETNS), &opts, &cancel)
            .await
            .unwrap();
        assert_eq!(result.interface_names(), vec!["eth0", "lo"]);
        assert_eq!(
            result.interfaces["eth0"].ip_configs[0].ip,
            IpAddr::V4(Ipv4Addr::new(10, 88, 0, 2))
        );
        assert!(network.is_attached(&id).await);
        assert_eq!(network.attachment_options(&id).await, Some(opts.clone()));

        network
            .detach(&id, Path::new(NETNS), &opts, &cancel)
            .await
            .unwrap();
        assert!(!network.is_attached(&id).await);
        assert_eq!(network.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_addresses_are_unique() {
        let network = MockNetwork::new(CniConfig::new().with_min_network_count(3));
        let cancel = CancellationToken::new();

        let first = SandboxId::new("first").unwrap();
        let second = SandboxId::new("second").unwrap();
        let opts = options(&first, &SandboxConfig::default());

        let a = network
            .attach(&first, Path::new(NETNS), &opts, &cancel)
            .await
            .unwrap();
        let b = network
            .attach(&second, Path::new(NETNS), &opts, &cancel)
            .await
            .unwrap();

        assert_eq!(a.interface_names(), vec!["eth0", "eth1", "lo"]);
        let mut all: Vec<IpAddr> = a.addresses().chain(b.addresses()).collect();
        let total = all.len();
        all.sort();
        all.dedup();
        // loopback addresses repeat across sandboxes
        assert_eq!(all.len(), total - 2);
    }

    #[tokio::test]
    async fn test_dns_reported() {
        let network = MockNetwork::default();
        let id = SandboxId::new("dns").unwrap();
        let config = SandboxConfig::new().with_dns_config(DnsConfig {
            servers: vec!["10.96.0.10".to_string()],
            ..Default::default()
        });

        let result = network
            .attach(
                &id,
                Path::new(NETNS),
                &options(&id, &config),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.dns[0].nameservers, vec!["10.96.0.10"]);
    }

    #[tokio::test]
    async fn test_duplicate_attach() {
        let network = MockNetwork::default();
        let id = SandboxId::new("twice").unwrap();
        let opts = options(&id, &SandboxConfig::default());
        let cancel = CancellationToken::new();

        network
            .attach(&id, Path::new(NETNS), &opts, &cancel)
            .await
            .unwrap();
        let err = network
            .attach(&id, Path::new(NETNS), &opts, &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already attached"));
    }

    #[tokio::test]
    async fn test_missing_netns() {
        let network = MockNetwork::default();
        let id = SandboxId::new("nonet").unwrap();
        let opts = options(&id, &SandboxConfig::default());

        let err = network
            .attach(
                &id,
                Path::new("/var/run/netns/does-not-exist"),
                &opts,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Attach { .. }));
        assert!(!network.is_attached(&id).await);
    }

    #[tokio::test]
    async fn test_detach_unknown_is_ok() {
        let network = MockNetwork::default();
        let id = SandboxId::new("unknown").unwrap();
        let opts = options(&id, &SandboxConfig::default());

        assert!(
            network
                .detach(&id, Path::new(NETNS), &opts, &CancellationToken::new())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let network = MockNetwork::default();
        let id = SandboxId::new("cancelled").unwrap();
        let opts = options(&id, &SandboxConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = network
            .attach(&id, Path::new(NETNS), &opts, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!network.is_attached(&id).await);
    }

    #[tokio::test]
    async fn test_initialize_checks_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = CniConfig::new()
            .with_bin_dir(dir.path())
            .with_conf_dir(dir.path());
        assert!(MockNetwork::initialize(config.clone()).await.is_ok());

        let err = MockNetwork::initialize(config.with_bin_dir(dir.path().join("bin")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Initialization { .. }));
    }
}
