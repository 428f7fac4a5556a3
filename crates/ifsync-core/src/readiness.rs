//! Readiness policy
//!
//! Pure functions that reduce per-interface observations into the single
//! system-wide "network ready" boolean. The engine recomputes after every
//! mutation that can change an interface's address set or running state and
//! publishes the result level-triggered; listeners are notified only on a
//! change.
//!
//! The locality rule: loopback and link-local addresses do not count toward
//! reachability, private (RFC1918) space does. A box holding a leased
//! 192.168.x address is reachable on its network.

use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::record::InterfaceRecord;
use crate::types::IpPrefix;

/// True for addresses confined to the local host or link
pub fn is_local_address(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_link_local(),
        // fe80::/10
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

/// Whether an interface in the given state counts as reachable
///
/// Running, and holding at least one address of either family that is not
/// confined to loopback/link-local scope.
pub fn is_reachable(running: bool, addresses: &[IpPrefix]) -> bool {
    running
        && addresses
            .iter()
            .any(|prefix| !is_local_address(&prefix.address()))
}

/// Reduce the registry into the system readiness value
///
/// Ready when every required interface is present and reachable, and at
/// least one interface overall is reachable. An empty required set leaves
/// only the second condition.
pub fn evaluate(records: &BTreeMap<String, InterfaceRecord>, required: &[String]) -> bool {
    let required_ok = required.iter().all(|name| {
        records
            .get(name)
            .map(|record| record.reachable)
            .unwrap_or(false)
    });

    required_ok && records.values().any(|record| record.reachable)
}
