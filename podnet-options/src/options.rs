//! Attachment option entries handed to the network manager

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use podnet_core::Result;

/// Capability key carrying the pod annotations
pub const POD_ANNOTATIONS_CAPABILITY: &str = "io.kubernetes.cri.pod-annotations";
/// Capability key for port mappings
pub const PORT_MAPPINGS_CAPABILITY: &str = "portMappings";
/// Capability key for traffic shaping
pub const BANDWIDTH_CAPABILITY: &str = "bandwidth";
/// Capability key for resolver configuration
pub const DNS_CAPABILITY: &str = "dns";

/// Port mapping in the `portMappings` capability format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMap {
    /// Port on the host
    pub host_port: i32,
    /// Port inside the sandbox
    pub container_port: i32,
    /// Lower-case protocol name
    pub protocol: String,
    /// Host address to bind, empty for all
    #[serde(rename = "hostIP")]
    pub host_ip: String,
}

/// Traffic shaping in the `bandwidth` capability format
///
/// Rates are bits per second; a direction without a rate is left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandWidth {
    /// Ingress rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_rate: Option<u64>,
    /// Ingress burst ceiling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_burst: Option<u64>,
    /// Egress rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_rate: Option<u64>,
    /// Egress burst ceiling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_burst: Option<u64>,
}

/// Resolver configuration in the `dns` capability format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    /// Nameserver addresses
    pub servers: Vec<String>,
    /// Search domains
    pub searches: Vec<String>,
    /// Resolver options
    pub options: Vec<String>,
}

/// Capability-scoped runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Capability {
    /// Raw pod annotations
    PodAnnotations(HashMap<String, String>),
    /// Host port mappings
    PortMappings(Vec<PortMap>),
    /// Traffic shaping
    Bandwidth(BandWidth),
    /// Resolver configuration
    Dns(Dns),
}

impl Capability {
    /// Key the capability is registered under
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::PodAnnotations(_) => POD_ANNOTATIONS_CAPABILITY,
            Self::PortMappings(_) => PORT_MAPPINGS_CAPABILITY,
            Self::Bandwidth(_) => BANDWIDTH_CAPABILITY,
            Self::Dns(_) => DNS_CAPABILITY,
        }
    }
}

/// A single option entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceOpt {
    /// Plugin arguments (`CNI_ARGS`)
    Labels(BTreeMap<String, String>),
    /// Capability argument (`runtimeConfig`)
    Capability(Capability),
}

impl From<Capability> for NamespaceOpt {
    fn from(capability: Capability) -> Self {
        Self::Capability(capability)
    }
}

/// Ordered option entries for one attach or detach call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentOptions(Vec<NamespaceOpt>);

impl AttachmentOptions {
    /// Create an empty option list
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an entry
    pub fn push(&mut self, opt: impl Into<NamespaceOpt>) {
        self.0.push(opt.into());
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, NamespaceOpt> {
        self.0.iter()
    }

    /// Labels entry, if any
    #[must_use]
    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.0.iter().find_map(|opt| match opt {
            NamespaceOpt::Labels(labels) => Some(labels),
            NamespaceOpt::Capability(_) => None,
        })
    }

    /// Capabilities in insertion order
    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter().filter_map(|opt| match opt {
            NamespaceOpt::Capability(capability) => Some(capability),
            NamespaceOpt::Labels(_) => None,
        })
    }

    /// Capability registered under `key`, if any
    #[must_use]
    pub fn capability(&self, key: &str) -> Option<&Capability> {
        self.capabilities().find(|capability| capability.key() == key)
    }

    /// Pod annotations capability, if any
    #[must_use]
    pub fn pod_annotations(&self) -> Option<&HashMap<String, String>> {
        match self.capability(POD_ANNOTATIONS_CAPABILITY)? {
            Capability::PodAnnotations(annotations) => Some(annotations),
            _ => None,
        }
    }

    /// Port mappings capability, if any
    #[must_use]
    pub fn port_mappings(&self) -> Option<&[PortMap]> {
        match self.capability(PORT_MAPPINGS_CAPABILITY)? {
            Capability::PortMappings(mappings) => Some(mappings),
            _ => None,
        }
    }

    /// Bandwidth capability, if any
    #[must_use]
    pub fn bandwidth(&self) -> Option<&BandWidth> {
        match self.capability(BANDWIDTH_CAPABILITY)? {
            Capability::Bandwidth(bandwidth) => Some(bandwidth),
            _ => None,
        }
    }

    /// DNS capability, if any
    #[must_use]
    pub fn dns(&self) -> Option<&Dns> {
        match self.capability(DNS_CAPABILITY)? {
            Capability::Dns(dns) => Some(dns),
            _ => None,
        }
    }

    /// Labels rendered as a `CNI_ARGS` string (`K=V;K=V`)
    #[must_use]
    pub fn cni_args(&self) -> String {
        self.labels()
            .map(|labels| {
                labels
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join(";")
            })
            .unwrap_or_default()
    }

    /// Capabilities rendered as a `runtimeConfig` object
    pub fn runtime_config(&self) -> Result<Value> {
        let mut config = Map::new();
        for capability in self.capabilities() {
            config.insert(
                capability.key().to_string(),
                serde_json::to_value(capability)?,
            );
        }
        Ok(Value::Object(config))
    }

    /// Render all entries for inspection
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::json!({
            "labels": self.labels(),
            "runtimeConfig": self.runtime_config()?,
        }))
    }
}

impl<'a> IntoIterator for &'a AttachmentOptions {
    type Item = &'a NamespaceOpt;
    type IntoIter = std::slice::Iter<'a, NamespaceOpt>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttachmentOptions {
        let mut options = AttachmentOptions::new();
        options.push(NamespaceOpt::Labels(BTreeMap::from([
            ("K8S_POD_NAME".to_string(), "pod".to_string()),
            ("IgnoreUnknown".to_string(), "1".to_string()),
        ])));
        options.push(Capability::PodAnnotations(HashMap::new()));
        options.push(Capability::PortMappings(vec![PortMap {
            host_port: 18080,
            container_port: 80,
            protocol: "tcp".to_string(),
            host_ip: String::new(),
        }]));
        options
    }

    #[test]
    fn test_accessors() {
        let options = sample();

        assert_eq!(options.len(), 3);
        assert_eq!(options.labels().unwrap().len(), 2);
        assert!(options.pod_annotations().unwrap().is_empty());
        assert_eq!(options.port_mappings().unwrap()[0].host_port, 18080);
        assert!(options.bandwidth().is_none());
        assert!(options.dns().is_none());
    }

    #[test]
    fn test_cni_args() {
        assert_eq!(sample().cni_args(), "IgnoreUnknown=1;K8S_POD_NAME=pod");
        assert_eq!(AttachmentOptions::new().cni_args(), "");
    }

    #[test]
    fn test_runtime_config_keys() {
        let config = sample().runtime_config().unwrap();

        assert_eq!(config[POD_ANNOTATIONS_CAPABILITY], serde_json::json!({}));
        assert_eq!(
            config[PORT_MAPPINGS_CAPABILITY],
            serde_json::json!([{
                "hostPort": 18080,
                "containerPort": 80,
                "protocol": "tcp",
                "hostIP": ""
            }])
        );
    }

    #[test]
    fn test_bandwidth_skips_absent_direction() {
        let bandwidth = BandWidth {
            ingress_rate: Some(1_000),
            ingress_burst: Some(u64::from(u32::MAX)),
            ..Default::default()
        };

        let json = serde_json::to_value(bandwidth).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ingressRate": 1000, "ingressBurst": 4_294_967_295_u64})
        );
    }
}
