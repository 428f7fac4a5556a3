// # Adapter Control Trait
//
// Defines the interface to the platform's network adapter layer.
//
// ## Implementations
//
// - iproute2-based (Linux): `ifsync-adapter-iproute` crate
// - Scripted mocks for contract tests: `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use ifsync_core::traits::AdapterControl;
// use tokio_stream::StreamExt;
//
// async fn dump(adapter: &dyn AdapterControl) -> anyhow::Result<()> {
//     for name in adapter.interfaces().await? {
//         let status = adapter.link_status(&name).await?;
//         println!("{}: up={} running={}", name, status.up, status.running);
//     }
//
//     let mut events = adapter.watch();
//     while let Some(event) = events.next().await {
//         println!("link change: {:?}", event);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;
use std::pin::Pin;
use tokio_stream::Stream;

use crate::types::{IpPrefix, MacAddress};

/// A link or administrative state change reported by the adapter layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    /// Interface the change applies to
    pub interface: String,
    /// Administrative state (configured up)
    pub up: bool,
    /// Operational state (carrier present, traffic possible)
    pub running: bool,
}

/// Snapshot of one interface's link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    /// Administrative state
    pub up: bool,
    /// Operational state
    pub running: bool,
    /// Hardware address, `None` if the adapter reports none
    pub mac: Option<MacAddress>,
}

/// Trait for adapter control implementations
///
/// The engine drives all interface mutation through this trait and never
/// touches the platform directly. Implementations must be thread-safe and
/// usable across async tasks.
///
/// Implementations report problems and get out of the way: they must not
/// retry failed commands (the engine retries naturally on the next link
/// event) and must not mutate anything beyond the verb they were asked to
/// perform.
#[async_trait]
pub trait AdapterControl: Send + Sync {
    /// Enumerate the interfaces currently known to the platform
    async fn interfaces(&self) -> Result<Vec<String>, crate::Error>;

    /// Query one interface's administrative/operational state and MAC
    ///
    /// # Errors
    ///
    /// `Error::AdapterUnavailable` if the interface does not exist.
    async fn link_status(&self, interface: &str) -> Result<LinkStatus, crate::Error>;

    /// List the addresses (both families) currently present on an interface
    async fn addresses(&self, interface: &str) -> Result<Vec<IpPrefix>, crate::Error>;

    /// Add an address, optionally with its broadcast address
    ///
    /// Adding an address that is already present is an implementation-defined
    /// error; callers check with [`AdapterControl::addresses`] first.
    async fn add_address(
        &self,
        interface: &str,
        prefix: IpPrefix,
        broadcast: Option<IpAddr>,
    ) -> Result<(), crate::Error>;

    /// Remove one address from an interface
    async fn remove_address(&self, interface: &str, prefix: IpPrefix)
    -> Result<(), crate::Error>;

    /// Install the default route through `gateway` on this interface,
    /// replacing any existing default route
    async fn set_gateway(&self, interface: &str, gateway: IpAddr) -> Result<(), crate::Error>;

    /// Bring the link administratively up or down
    async fn set_link(&self, interface: &str, up: bool) -> Result<(), crate::Error>;

    /// Commit pending address changes
    ///
    /// Platforms that apply changes immediately implement this as a no-op.
    async fn commit(&self, interface: &str) -> Result<(), crate::Error>;

    /// Watch for link and administrative state changes
    ///
    /// Returns a stream that yields a [`LinkEvent`] for every observed
    /// change. The stream runs until dropped; dropping it must release the
    /// underlying watcher resources.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = LinkEvent> + Send + 'static>>;
}
