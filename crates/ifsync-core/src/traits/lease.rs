// # Lease Client Trait
//
// Defines the interface to the address lease protocol. The wire exchange
// itself (discovery, offers, acknowledgements, per-packet retransmission)
// lives behind this trait; the engine only sees the outcome.
//
// ## Implementations
//
// - dhcpcd probe runner: `ifsync-lease-dhcpcd` crate
// - Scripted mocks for contract tests: `tests/common`

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::types::{IpPrefix, MacAddress};

/// A successfully negotiated lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseOffer {
    /// Leased address
    pub address: IpAddr,
    /// Prefix length derived from the offered netmask
    pub prefix_len: u8,
    /// Default gateway, when the lease carries one
    pub gateway: Option<IpAddr>,
    /// Broadcast address, when the lease carries one
    pub broadcast: Option<IpAddr>,
    /// Name servers advertised by the lease, in offer order
    pub dns_servers: Vec<IpAddr>,
    /// Address of the server that granted the lease
    pub server: Option<IpAddr>,
}

impl LeaseOffer {
    /// The leased address as a CIDR prefix
    pub fn prefix(&self) -> Result<IpPrefix, crate::Error> {
        IpPrefix::new(self.address, self.prefix_len)
    }
}

/// Trait for lease protocol implementations
///
/// One request negotiates one lease for one interface. The engine spawns at
/// most one request per interface at a time and records the outcome in the
/// interface's lease state; implementations hold no cross-request state.
#[async_trait]
pub trait LeaseClient: Send + Sync {
    /// Attempt to obtain a lease for `interface`
    ///
    /// # Parameters
    ///
    /// - `interface`: interface to negotiate on
    /// - `mac`: hardware address the request is keyed by
    /// - `hint`: previously known address to ask for again, if any
    /// - `timeout`: budget for a single attempt
    /// - `retries`: additional attempts after the first failure
    ///
    /// # Behavior
    ///
    /// Must terminate within roughly `timeout * (retries + 1)`; the engine
    /// enforces an outer deadline slightly above that and treats overrun as
    /// failure.
    async fn request(
        &self,
        interface: &str,
        mac: MacAddress,
        hint: Option<IpAddr>,
        timeout: Duration,
        retries: usize,
    ) -> Result<LeaseOffer, crate::Error>;
}
