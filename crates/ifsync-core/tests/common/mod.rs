//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides scripted stand-ins for the adapter and lease layers
//! so the engine's behavior can be verified without touching a real network
//! stack.

use ifsync_core::config::{EngineConfig, InterfaceEntry};
use ifsync_core::engine::EngineEvent;
use ifsync_core::error::{Error, Result};
use ifsync_core::traits::{
    AdapterControl, LeaseClient, LeaseOffer, LinkEvent, LinkStatus, ReadinessSignal,
};
use ifsync_core::types::{IpPrefix, MacAddress};

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// One simulated interface inside the [`MockAdapter`]
#[derive(Debug, Clone)]
pub struct FakeInterface {
    pub up: bool,
    pub running: bool,
    pub mac: Option<MacAddress>,
    pub addresses: Vec<IpPrefix>,
    pub gateway: Option<IpAddr>,
}

impl FakeInterface {
    /// An interface that is up with carrier and a hardware address
    pub fn running(mac: &str) -> Self {
        Self {
            up: true,
            running: true,
            mac: Some(mac.parse().expect("valid MAC in test")),
            addresses: Vec::new(),
            gateway: None,
        }
    }

    /// An interface that is administratively down
    pub fn down(mac: &str) -> Self {
        Self {
            up: false,
            running: false,
            mac: Some(mac.parse().expect("valid MAC in test")),
            addresses: Vec::new(),
            gateway: None,
        }
    }

    /// Pre-set addresses on the simulated interface
    pub fn with_addresses(mut self, addresses: &[&str]) -> Self {
        self.addresses = addresses
            .iter()
            .map(|a| a.parse().expect("valid prefix in test"))
            .collect();
        self
    }
}

/// A scripted AdapterControl that tracks calls
pub struct MockAdapter {
    interfaces: Mutex<BTreeMap<String, FakeInterface>>,
    add_call_count: AtomicUsize,
    remove_call_count: AtomicUsize,
    gateway_call_count: AtomicUsize,
    link_call_count: AtomicUsize,
    commit_call_count: AtomicUsize,
    fail_adds: AtomicBool,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            interfaces: Mutex::new(BTreeMap::new()),
            add_call_count: AtomicUsize::new(0),
            remove_call_count: AtomicUsize::new(0),
            gateway_call_count: AtomicUsize::new(0),
            link_call_count: AtomicUsize::new(0),
            commit_call_count: AtomicUsize::new(0),
            fail_adds: AtomicBool::new(false),
        }
    }

    /// Register a simulated interface
    pub fn insert(&self, name: &str, iface: FakeInterface) {
        self.interfaces
            .lock()
            .unwrap()
            .insert(name.to_string(), iface);
    }

    /// Flip the carrier state without going through the engine
    pub fn set_running(&self, name: &str, running: bool) {
        if let Some(iface) = self.interfaces.lock().unwrap().get_mut(name) {
            iface.running = running;
        }
    }

    /// Overwrite the simulated address list behind the engine's back
    pub fn set_addresses(&self, name: &str, addresses: &[&str]) {
        if let Some(iface) = self.interfaces.lock().unwrap().get_mut(name) {
            iface.addresses = addresses
                .iter()
                .map(|a| a.parse().expect("valid prefix in test"))
                .collect();
        }
    }

    /// Current addresses on the simulated interface
    pub fn addresses_of(&self, name: &str) -> Vec<IpPrefix> {
        self.interfaces
            .lock()
            .unwrap()
            .get(name)
            .map(|iface| iface.addresses.clone())
            .unwrap_or_default()
    }

    /// Current default gateway on the simulated interface
    pub fn gateway_of(&self, name: &str) -> Option<IpAddr> {
        self.interfaces
            .lock()
            .unwrap()
            .get(name)
            .and_then(|iface| iface.gateway)
    }

    /// Administrative state of the simulated interface
    pub fn is_up(&self, name: &str) -> bool {
        self.interfaces
            .lock()
            .unwrap()
            .get(name)
            .map(|iface| iface.up)
            .unwrap_or(false)
    }

    /// Get the number of times add_address() was called
    pub fn add_call_count(&self) -> usize {
        self.add_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times remove_address() was called
    pub fn remove_call_count(&self) -> usize {
        self.remove_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times set_gateway() was called
    pub fn gateway_call_count(&self) -> usize {
        self.gateway_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times set_link() was called
    pub fn link_call_count(&self) -> usize {
        self.link_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times commit() was called
    pub fn commit_call_count(&self) -> usize {
        self.commit_call_count.load(Ordering::SeqCst)
    }

    /// Make every subsequent add_address() call fail
    pub fn fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl AdapterControl for MockAdapter {
    async fn interfaces(&self) -> Result<Vec<String>> {
        Ok(self.interfaces.lock().unwrap().keys().cloned().collect())
    }

    async fn link_status(&self, interface: &str) -> Result<LinkStatus> {
        self.interfaces
            .lock()
            .unwrap()
            .get(interface)
            .map(|iface| LinkStatus {
                up: iface.up,
                running: iface.running,
                mac: iface.mac,
            })
            .ok_or_else(|| Error::adapter_unavailable(interface))
    }

    async fn addresses(&self, interface: &str) -> Result<Vec<IpPrefix>> {
        self.interfaces
            .lock()
            .unwrap()
            .get(interface)
            .map(|iface| iface.addresses.clone())
            .ok_or_else(|| Error::adapter_unavailable(interface))
    }

    async fn add_address(
        &self,
        interface: &str,
        prefix: IpPrefix,
        _broadcast: Option<IpAddr>,
    ) -> Result<()> {
        self.add_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_adds.load(Ordering::SeqCst) {
            return Err(Error::adapter("scripted add_address failure"));
        }
        let mut interfaces = self.interfaces.lock().unwrap();
        let iface = interfaces
            .get_mut(interface)
            .ok_or_else(|| Error::adapter_unavailable(interface))?;
        if !iface.addresses.contains(&prefix) {
            iface.addresses.push(prefix);
        }
        Ok(())
    }

    async fn remove_address(&self, interface: &str, prefix: IpPrefix) -> Result<()> {
        self.remove_call_count.fetch_add(1, Ordering::SeqCst);
        let mut interfaces = self.interfaces.lock().unwrap();
        let iface = interfaces
            .get_mut(interface)
            .ok_or_else(|| Error::adapter_unavailable(interface))?;
        let before = iface.addresses.len();
        iface.addresses.retain(|a| *a != prefix);
        if iface.addresses.len() == before {
            return Err(Error::adapter(format!("{} not present", prefix)));
        }
        Ok(())
    }

    async fn set_gateway(&self, interface: &str, gateway: IpAddr) -> Result<()> {
        self.gateway_call_count.fetch_add(1, Ordering::SeqCst);
        let mut interfaces = self.interfaces.lock().unwrap();
        let iface = interfaces
            .get_mut(interface)
            .ok_or_else(|| Error::adapter_unavailable(interface))?;
        iface.gateway = Some(gateway);
        Ok(())
    }

    async fn set_link(&self, interface: &str, up: bool) -> Result<()> {
        self.link_call_count.fetch_add(1, Ordering::SeqCst);
        let mut interfaces = self.interfaces.lock().unwrap();
        let iface = interfaces
            .get_mut(interface)
            .ok_or_else(|| Error::adapter_unavailable(interface))?;
        iface.up = up;
        if !up {
            iface.running = false;
        }
        Ok(())
    }

    async fn commit(&self, _interface: &str) -> Result<()> {
        self.commit_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = LinkEvent> + Send + 'static>> {
        // Tests drive on_adapter_event directly; the stream stays silent
        let (_tx, rx) = mpsc::unbounded_channel();
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }
}

/// What the [`MockLeaseClient`] should do for one interface
#[derive(Debug, Clone)]
pub enum LeaseScript {
    /// Return this offer immediately
    Offer(LeaseOffer),
    /// Fail immediately
    Fail,
    /// Never answer (exercises the engine's outer deadline)
    Hang,
}

/// A scripted LeaseClient that tracks calls
pub struct MockLeaseClient {
    script: Mutex<HashMap<String, LeaseScript>>,
    request_call_count: AtomicUsize,
    hints: Mutex<Vec<Option<IpAddr>>>,
    macs: Mutex<Vec<MacAddress>>,
}

impl MockLeaseClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            request_call_count: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
            macs: Mutex::new(Vec::new()),
        }
    }

    /// Script the outcome for one interface (unscripted interfaces fail)
    pub fn script(&self, interface: &str, action: LeaseScript) {
        self.script
            .lock()
            .unwrap()
            .insert(interface.to_string(), action);
    }

    /// Get the number of times request() was called
    pub fn request_call_count(&self) -> usize {
        self.request_call_count.load(Ordering::SeqCst)
    }

    /// The hint passed to the most recent request, if any request happened
    pub fn last_hint(&self) -> Option<Option<IpAddr>> {
        self.hints.lock().unwrap().last().copied()
    }

    /// The MAC passed to the most recent request
    pub fn last_mac(&self) -> Option<MacAddress> {
        self.macs.lock().unwrap().last().copied()
    }
}

#[async_trait::async_trait]
impl LeaseClient for MockLeaseClient {
    async fn request(
        &self,
        interface: &str,
        mac: MacAddress,
        hint: Option<IpAddr>,
        _timeout: Duration,
        _retries: usize,
    ) -> Result<LeaseOffer> {
        self.request_call_count.fetch_add(1, Ordering::SeqCst);
        self.hints.lock().unwrap().push(hint);
        self.macs.lock().unwrap().push(mac);

        let action = self.script.lock().unwrap().get(interface).cloned();
        match action {
            Some(LeaseScript::Offer(offer)) => Ok(offer),
            Some(LeaseScript::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::lease_timeout(interface))
            }
            _ => Err(Error::lease_failed(interface, "scripted failure")),
        }
    }
}

/// Build a lease offer for tests
pub fn offer(address: &str, prefix_len: u8, gateway: Option<&str>, dns: &[&str]) -> LeaseOffer {
    LeaseOffer {
        address: address.parse().expect("valid address in test"),
        prefix_len,
        gateway: gateway.map(|g| g.parse().expect("valid gateway in test")),
        broadcast: None,
        dns_servers: dns
            .iter()
            .map(|d| d.parse().expect("valid DNS address in test"))
            .collect(),
        server: Some("10.0.0.1".parse().unwrap()),
    }
}

/// A readiness signal that records every level it was set to
#[derive(Default)]
pub struct CountingSignal {
    value: AtomicBool,
    set_call_count: AtomicUsize,
    history: Mutex<Vec<bool>>,
}

impl CountingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of times set() was called
    pub fn set_call_count(&self) -> usize {
        self.set_call_count.load(Ordering::SeqCst)
    }

    /// Every value set() received, in order
    pub fn history(&self) -> Vec<bool> {
        self.history.lock().unwrap().clone()
    }
}

impl ReadinessSignal for CountingSignal {
    fn set(&self, ready: bool) {
        self.set_call_count.fetch_add(1, Ordering::SeqCst);
        self.value.store(ready, Ordering::SeqCst);
        self.history.lock().unwrap().push(ready);
    }

    fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }
}

/// Helper to create an EngineConfig whose file side effects stay inside
/// a test directory
pub fn test_config(dir: &Path, interfaces: Vec<InterfaceEntry>) -> EngineConfig {
    let mut config = EngineConfig::new();
    config.interfaces = interfaces;
    config.response_timeout_secs = 1;
    config.lease_retries = 0;
    config.dns_file = dir.join("resolv.conf");
    config.store_path = Some(dir.join("leases.json"));
    config.event_channel_capacity = 100;
    config
}

/// Drain every event currently queued on the receiver
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
