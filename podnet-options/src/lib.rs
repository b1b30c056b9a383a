//! Sandbox network option builder
//!
//! Translates a pod sandbox configuration into the ordered list of options
//! handed to the network manager:
//! - Labels - pod identity passed as plugin arguments
//! - Pod annotations - passed through verbatim
//! - Port mappings - explicit host ports only
//! - Bandwidth - validated ingress/egress shaping from annotations
//! - DNS - resolver configuration, whenever the runtime sent one

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod bandwidth;
pub mod builder;
pub mod options;

pub use bandwidth::{extract_bandwidth, to_bandwidth, validate_bandwidth};
pub use builder::build_attachment_options;
pub use options::{AttachmentOptions, BandWidth, Capability, Dns, NamespaceOpt, PortMap};
