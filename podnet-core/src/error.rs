//! Error types for Podnet

use thiserror::Error;

use crate::quantity::QuantityError;

/// Podnet error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Bandwidth annotations are malformed or out of range
    #[error("reading pod bandwidth annotations: {0}")]
    Bandwidth(#[from] BandwidthError),

    /// Network manager could not be initialized
    #[error("Failed to initialize network manager: {message}")]
    Initialization {
        /// Error message
        message: String,
    },

    /// Attaching the sandbox network failed
    #[error("Failed to set up network for sandbox {sandbox_id}: {message}")]
    Attach {
        /// Sandbox the attach was issued for
        sandbox_id: String,
        /// Error message
        message: String,
    },

    /// Detaching the sandbox network failed
    #[error("Failed to tear down network for sandbox {sandbox_id}: {message}")]
    Detach {
        /// Sandbox the detach was issued for
        sandbox_id: String,
        /// Error message
        message: String,
    },

    /// Operation was cancelled before it completed
    #[error("Operation cancelled: {operation}")]
    Cancelled {
        /// Operation that was cancelled
        operation: String,
    },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check whether this error came from cancellation rather than a failure
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Validation failures for the bandwidth annotations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BandwidthError {
    /// The annotation value is not a quantity
    #[error("invalid {annotation} value: {error}")]
    Parse {
        /// Annotation key holding the bad value
        annotation: String,
        /// Parse failure
        error: QuantityError,
    },

    /// Rate below 1 kbit/s
    #[error("resource is unreasonably small (< 1kbit)")]
    TooSmall,

    /// Rate above 1 Pbit/s
    #[error("resource is unreasonably large (> 1Pbit)")]
    TooLarge,
}

/// Result type alias for Podnet operations
pub type Result<T> = std::result::Result<T, Error>;
