//! Error types for the reconciliation engine
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciliation engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (duplicate or invalid entries, fatal to setup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A control request named an interface that is not registered
    #[error("Unknown interface: {0}")]
    UnknownInterface(String),

    /// Resolver file or lease store I/O failure (non-fatal, logged)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Lease negotiation exceeded its timeout/retry budget
    #[error("Lease request timed out on {interface}")]
    LeaseTimeout {
        /// Interface under negotiation
        interface: String,
    },

    /// Lease negotiation completed with a failure
    #[error("Lease request failed on {interface}: {reason}")]
    LeaseFailed {
        /// Interface under negotiation
        interface: String,
        /// Failure detail from the lease client
        reason: String,
    },

    /// The interface is absent, down, or missing a hardware address
    #[error("Adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// An adapter command itself failed
    #[error("Adapter error: {0}")]
    Adapter(String),

    /// An event arrived before the engine was configured
    #[error("Engine not started")]
    NotStarted,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unknown-interface error
    pub fn unknown_interface(name: impl Into<String>) -> Self {
        Self::UnknownInterface(name.into())
    }

    /// Create a lease-timeout error
    pub fn lease_timeout(interface: impl Into<String>) -> Self {
        Self::LeaseTimeout {
            interface: interface.into(),
        }
    }

    /// Create a lease-failure error
    pub fn lease_failed(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LeaseFailed {
            interface: interface.into(),
            reason: reason.into(),
        }
    }

    /// Create an adapter-unavailable error
    pub fn adapter_unavailable(msg: impl Into<String>) -> Self {
        Self::AdapterUnavailable(msg.into())
    }

    /// Create an adapter command error
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
