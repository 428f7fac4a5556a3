//! Per-interface state
//!
//! An [`InterfaceRecord`] tracks one interface's assignment mode, last known
//! address configuration, hardware address, lease progress, and observed
//! reachability. Records are created at configure time (or on first sighting
//! in open mode), mutated only by the engine under its lock, and never
//! removed while the engine runs; resets bring them back toward an
//! unconfigured state instead.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::config::InterfaceEntry;
use crate::types::{IpPrefix, MacAddress};

/// Address assignment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Operator-supplied fixed address
    Static,
    /// Address obtained through the lease protocol
    Dynamic,
}

/// Progress of lease negotiation for a dynamic interface
///
/// A static record stays at [`LeaseState::None`] for its whole life; the
/// other states are reachable only while the mode is dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaseState {
    /// No lease activity
    None,
    /// A lease request is in flight
    Pending,
    /// The current address was obtained from an accepted lease
    Active,
    /// A previously held lease is no longer valid (link went away, or the
    /// address was restored from the store at startup)
    Expired,
    /// The last lease attempt failed; any earlier address is retained
    Failed,
}

/// Per-interface state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    /// Interface name, unique registry key
    pub name: String,

    /// Assignment mode
    pub mode: Mode,

    /// Last known address: the static target, or the most recent lease
    pub address: Option<IpPrefix>,

    /// Default gateway that accompanies the address
    pub gateway: Option<IpAddr>,

    /// Broadcast address that accompanies the address
    pub broadcast: Option<IpAddr>,

    /// Hardware address, refreshed on each reconciliation pass
    pub mac: Option<MacAddress>,

    /// Lease negotiation progress
    pub lease_state: LeaseState,

    /// Name servers advertised by the active lease (empty if none)
    pub lease_dns_servers: Vec<IpAddr>,

    /// Last observed reachability (running with a non-local address)
    pub reachable: bool,
}

impl InterfaceRecord {
    /// Create an unconfigured record
    pub fn new(name: impl Into<String>, mode: Mode) -> Self {
        Self {
            name: name.into(),
            mode,
            address: None,
            gateway: None,
            broadcast: None,
            mac: None,
            lease_state: LeaseState::None,
            lease_dns_servers: Vec::new(),
            reachable: false,
        }
    }

    /// Create a record seeded from a configuration entry
    pub fn from_entry(entry: &InterfaceEntry) -> Self {
        Self {
            name: entry.interface.clone(),
            mode: entry.mode,
            address: entry.address,
            gateway: entry.gateway,
            broadcast: entry.broadcast,
            mac: None,
            lease_state: LeaseState::None,
            lease_dns_servers: Vec::new(),
            reachable: false,
        }
    }

    /// True when the current address came from a lease that is still active
    pub fn has_active_lease(&self) -> bool {
        self.lease_state == LeaseState::Active
    }

    /// Void any lease progress, keeping the address as a future hint
    pub fn void_lease(&mut self) {
        if self.mode == Mode::Dynamic {
            self.lease_state = match self.lease_state {
                LeaseState::Active => LeaseState::Expired,
                _ => LeaseState::None,
            };
        }
        self.lease_dns_servers.clear();
    }

    /// Reset lease progress entirely, as after an explicit flush
    pub fn reset(&mut self) {
        self.lease_state = LeaseState::None;
        self.lease_dns_servers.clear();
        self.reachable = false;
    }
}
