//! Configuration types for the reconciliation engine
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::record::Mode;
use crate::types::IpPrefix;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interfaces under explicit management
    #[serde(default)]
    pub interfaces: Vec<InterfaceEntry>,

    /// Interfaces that must be reachable for the readiness signal
    #[serde(default)]
    pub required: Vec<String>,

    /// Open mode: adopt interfaces that have no explicit entry as
    /// default-dynamic records when they are first observed
    #[serde(default)]
    pub open: bool,

    /// Per-attempt lease response timeout (in seconds)
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,

    /// Additional lease attempts after the first one fails
    #[serde(default = "default_lease_retries")]
    pub lease_retries: usize,

    /// Shared resolver file holding this engine's managed section
    #[serde(default = "default_dns_file")]
    pub dns_file: PathBuf,

    /// Statically configured name servers, listed before any lease-advertised
    /// servers in the managed section
    #[serde(default)]
    pub dns_servers: Vec<IpAddr>,

    /// Owner identity embedded in the managed-section markers
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Lease store file; `None` disables persistence
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            interfaces: Vec::new(),
            required: Vec::new(),
            open: false,
            response_timeout_secs: default_response_timeout_secs(),
            lease_retries: default_lease_retries(),
            dns_file: default_dns_file(),
            dns_servers: Vec::new(),
            owner: default_owner(),
            store_path: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let mut seen = HashSet::new();
        for entry in &self.interfaces {
            if entry.interface.is_empty() {
                return Err(crate::Error::config("Interface name cannot be empty"));
            }
            if !seen.insert(entry.interface.as_str()) {
                return Err(crate::Error::config(format!(
                    "Interface {} configured more than once",
                    entry.interface
                )));
            }
            entry.validate()?;
        }

        if self.owner.is_empty() {
            return Err(crate::Error::config("Section owner cannot be empty"));
        }
        if self.response_timeout_secs == 0 {
            return Err(crate::Error::config("Lease response timeout must be > 0"));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-interface configuration entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceEntry {
    /// Interface name (e.g. "eth0")
    pub interface: String,

    /// Address assignment mode
    #[serde(default = "default_mode")]
    pub mode: Mode,

    /// Static address (required for static mode)
    #[serde(default)]
    pub address: Option<IpPrefix>,

    /// Default gateway to install alongside the address
    #[serde(default)]
    pub gateway: Option<IpAddr>,

    /// Broadcast address to install alongside the address
    #[serde(default)]
    pub broadcast: Option<IpAddr>,
}

impl InterfaceEntry {
    /// Create a new entry
    pub fn new(interface: impl Into<String>, mode: Mode) -> Self {
        Self {
            interface: interface.into(),
            mode,
            address: None,
            gateway: None,
            broadcast: None,
        }
    }

    /// Set the static address
    pub fn with_address(mut self, address: IpPrefix) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the gateway
    pub fn with_gateway(mut self, gateway: IpAddr) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the broadcast address
    pub fn with_broadcast(mut self, broadcast: IpAddr) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.mode == Mode::Static && self.address.is_none() {
            return Err(crate::Error::config(format!(
                "Static interface {} has no address",
                self.interface
            )));
        }
        Ok(())
    }
}

fn default_mode() -> Mode {
    Mode::Dynamic
}

fn default_response_timeout_secs() -> u64 {
    5
}

fn default_lease_retries() -> usize {
    3
}

fn default_dns_file() -> PathBuf {
    PathBuf::from("/etc/resolv.conf")
}

fn default_owner() -> String {
    "ifsync".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
