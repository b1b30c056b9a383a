//! Attachment option assembly

use std::collections::BTreeMap;
use tracing::debug;

use podnet_core::{DnsConfig, PortMapping, Result, SandboxConfig};

use crate::bandwidth::to_bandwidth;
use crate::options::{AttachmentOptions, Capability, Dns, NamespaceOpt, PortMap};

/// Build the attachment options for a sandbox
///
/// Labels and pod annotations always come first. Port mappings, bandwidth
/// and DNS follow when there is something to send.
///
/// # Errors
/// Returns [`podnet_core::Error::Bandwidth`] if a bandwidth annotation has a
/// bad unit or an unreasonable value.
pub fn build_attachment_options(id: &str, config: &SandboxConfig) -> Result<AttachmentOptions> {
    let mut options = AttachmentOptions::new();
    options.push(NamespaceOpt::Labels(to_labels(id, config)));
    options.push(Capability::PodAnnotations(config.annotations.clone()));

    let port_mappings = to_port_mappings(&config.port_mappings);
    if !port_mappings.is_empty() {
        options.push(Capability::PortMappings(port_mappings));
    }

    if let Some(bandwidth) = to_bandwidth(&config.annotations)? {
        options.push(Capability::Bandwidth(bandwidth));
    }

    if let Some(dns) = to_dns(config.dns_config.as_ref()) {
        options.push(Capability::Dns(dns));
    }

    debug!(
        sandbox_id = id,
        entries = options.len(),
        port_mappings = options.port_mappings().map_or(0, <[PortMap]>::len),
        bandwidth = options.bandwidth().is_some(),
        dns = options.dns().is_some(),
        "Built attachment options"
    );

    Ok(options)
}

/// Pod identity as plugin arguments
#[must_use]
pub fn to_labels(id: &str, config: &SandboxConfig) -> BTreeMap<String, String> {
    let metadata = config.metadata();
    BTreeMap::from([
        ("K8S_POD_NAMESPACE".to_string(), metadata.namespace.clone()),
        ("K8S_POD_NAME".to_string(), metadata.name.clone()),
        ("K8S_POD_INFRA_CONTAINER_ID".to_string(), id.to_string()),
        ("K8S_POD_UID".to_string(), metadata.uid.clone()),
        ("IgnoreUnknown".to_string(), "1".to_string()),
    ])
}

/// Port mappings with an explicit host port
///
/// A host port of zero or below asks the plugin to pick one, which is not
/// supported here, so those entries are dropped.
#[must_use]
pub fn to_port_mappings(mappings: &[PortMapping]) -> Vec<PortMap> {
    mappings
        .iter()
        .filter(|mapping| mapping.host_port > 0)
        .map(|mapping| PortMap {
            host_port: mapping.host_port,
            container_port: mapping.container_port,
            protocol: mapping.protocol.as_str().to_lowercase(),
            host_ip: mapping.host_ip.clone(),
        })
        .collect()
}

/// Resolver configuration, present whenever the runtime sent one
#[must_use]
pub fn to_dns(dns: Option<&DnsConfig>) -> Option<Dns> {
    dns.map(|dns| Dns {
        servers: dns.servers.clone(),
        searches: dns.searches.clone(),
        options: dns.options.clone(),
    })
}
