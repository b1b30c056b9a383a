//! Attachment results reported by the network manager

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Outcome of a successful attach
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentResult {
    /// Interfaces keyed by name
    pub interfaces: BTreeMap<String, InterfaceConfig>,

    /// Resolver settings reported by the plugins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<DnsResult>,

    /// Routes installed in the sandbox
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

impl AttachmentResult {
    /// Interface names in sorted order
    #[must_use]
    pub fn interface_names(&self) -> Vec<String> {
        self.interfaces.keys().cloned().collect()
    }

    /// All addresses across interfaces
    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.interfaces
            .values()
            .flat_map(|iface| iface.ip_configs.iter().map(|ip| ip.ip))
    }
}

/// A sandbox interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceConfig {
    /// Addresses assigned to the interface
    pub ip_configs: Vec<IpConfig>,
    /// Hardware address
    pub mac: String,
    /// Namespace path the interface lives in
    pub sandbox: String,
}

/// An address assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfig {
    /// Address
    pub ip: IpAddr,
    /// Prefix length
    pub prefix_len: u8,
    /// Gateway, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
}

/// Resolver settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsResult {
    /// Nameserver addresses
    pub nameservers: Vec<String>,
    /// Search domains
    pub search: Vec<String>,
    /// Resolver options
    pub options: Vec<String>,
}

/// A route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Destination in CIDR notation
    pub dst: String,
    /// Next hop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gw: Option<IpAddr>,
}
