//! Podnet Core - Sandbox data model, quantities and errors
//!
//! This crate provides the value types shared by the option builder, the
//! network manager seam and the CLI driver.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod events;
pub mod quantity;
pub mod sandbox;
pub mod types;

pub use error::{BandwidthError, Error, Result};
pub use events::NetworkEvent;
pub use quantity::{Quantity, QuantityError};
pub use sandbox::{DnsConfig, PortMapping, Protocol, SandboxConfig, SandboxMetadata};
pub use types::SandboxId;
