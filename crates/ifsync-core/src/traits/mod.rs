//! Core traits for the reconciliation engine
//!
//! This module defines the abstract interfaces behind which the external
//! collaborators live.
//!
//! - [`AdapterControl`]: enumerate, query, and mutate network interfaces
//! - [`LeaseClient`]: negotiate address leases
//! - [`ReadinessSignal`]: the system-wide "network ready" flag

pub mod adapter;
pub mod lease;
pub mod signal;

pub use adapter::{AdapterControl, LinkEvent, LinkStatus};
pub use lease::{LeaseClient, LeaseOffer};
pub use signal::{ReadinessSignal, SharedReadinessFlag};
