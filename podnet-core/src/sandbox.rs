//! Pod sandbox configuration as handed over by the container runtime
//!
//! Field names follow the CRI `PodSandboxConfig` JSON encoding. Every field
//! is optional on input; absent nested structures read as empty values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

static EMPTY_METADATA: SandboxMetadata = SandboxMetadata {
    name: String::new(),
    uid: String::new(),
    namespace: String::new(),
    attempt: 0,
};

/// Pod sandbox configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxConfig {
    /// Pod identity
    pub metadata: Option<SandboxMetadata>,

    /// Hostname of the sandbox
    pub hostname: String,

    /// Directory holding the container logs of the pod
    pub log_directory: String,

    /// Resolver configuration; `None` when the runtime sent none
    pub dns_config: Option<DnsConfig>,

    /// Requested port mappings
    pub port_mappings: Vec<PortMapping>,

    /// Pod labels
    pub labels: HashMap<String, String>,

    /// Pod annotations
    pub annotations: HashMap<String, String>,
}

impl SandboxConfig {
    /// Create an empty sandbox configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pod metadata, or empty metadata when none was given
    #[must_use]
    pub fn metadata(&self) -> &SandboxMetadata {
        self.metadata.as_ref().unwrap_or(&EMPTY_METADATA)
    }

    /// Set pod name, UID and namespace
    #[must_use]
    pub fn with_metadata(
        mut self,
        name: impl Into<String>,
        uid: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        self.metadata = Some(SandboxMetadata {
            name: name.into(),
            uid: uid.into(),
            namespace: namespace.into(),
            attempt: 0,
        });
        self
    }

    /// Set the sandbox hostname
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the DNS configuration
    #[must_use]
    pub fn with_dns_config(mut self, dns: DnsConfig) -> Self {
        self.dns_config = Some(dns);
        self
    }

    /// Add a port mapping
    #[must_use]
    pub fn with_port_mapping(mut self, mapping: PortMapping) -> Self {
        self.port_mappings.push(mapping);
        self
    }

    /// Add an annotation
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Add a label
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Pod identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxMetadata {
    /// Pod name
    pub name: String,
    /// Pod UID
    pub uid: String,
    /// Pod namespace
    pub namespace: String,
    /// Creation attempt
    pub attempt: u32,
}

/// Transport protocol of a port mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// TCP
    #[default]
    Tcp,
    /// UDP
    Udp,
    /// SCTP
    Sctp,
}

impl Protocol {
    /// Protocol name as the CRI spells it
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Sctp => "SCTP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single port mapping request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortMapping {
    /// Protocol
    pub protocol: Protocol,
    /// Port inside the sandbox
    pub container_port: i32,
    /// Port on the host; zero or negative lets the plugin choose
    pub host_port: i32,
    /// Host address to bind, empty for all
    pub host_ip: String,
}

impl PortMapping {
    /// Create a mapping for the given protocol
    #[must_use]
    pub fn new(protocol: Protocol, container_port: i32, host_port: i32) -> Self {
        Self {
            protocol,
            container_port,
            host_port,
            host_ip: String::new(),
        }
    }

    /// Create a TCP mapping
    #[must_use]
    pub fn tcp(container_port: i32, host_port: i32) -> Self {
        Self::new(Protocol::Tcp, container_port, host_port)
    }

    /// Create a UDP mapping
    #[must_use]
    pub fn udp(container_port: i32, host_port: i32) -> Self {
        Self::new(Protocol::Udp, container_port, host_port)
    }

    /// Bind to a specific host address
    #[must_use]
    pub fn with_host_ip(mut self, host_ip: impl Into<String>) -> Self {
        self.host_ip = host_ip.into();
        self
    }
}

/// Resolver configuration for the sandbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Nameserver addresses
    pub servers: Vec<String>,
    /// Search domains
    pub searches: Vec<String>,
    /// Resolver options
    pub options: Vec<String>,
}

impl DnsConfig {
    /// Check whether all three lists are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty() && self.searches.is_empty() && self.options.is_empty()
    }
}
