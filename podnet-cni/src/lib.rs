//! Network manager seam and sandbox attachment driver
//!
//! The plugin discovery and invocation machinery sits behind the
//! [`NetworkManager`] trait. This crate provides:
//! - [`CniConfig`] - plugin directories and network count limits
//! - [`MockNetwork`] - in-process manager for tests and dry runs
//! - [`SandboxNetwork`] - attach (and optionally detach) driver

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod backend;
pub mod config;
pub mod driver;
pub mod mock;
pub mod result;

pub use backend::NetworkManager;
pub use config::CniConfig;
pub use driver::{SandboxNetwork, SandboxNetworkRequest};
pub use mock::MockNetwork;
pub use result::{AttachmentResult, InterfaceConfig, IpConfig};

// Re-export the cancellation handle taken by every manager call
pub use tokio_util::sync::CancellationToken;
