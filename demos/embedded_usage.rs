//! Minimal embedding example for ifsync-core
//!
//! This example demonstrates using ifsync-core as a library in a custom
//! application. The platform is simulated in memory: the adapter and lease
//! client are small custom components, so the example runs anywhere without
//! touching real interfaces.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ifsync_core::{
    AdapterControl, EngineConfig, InterfaceEntry, IpPrefix, LeaseClient, LeaseOffer, LinkEvent,
    LinkStatus, MacAddress, Mode, ReadinessSignal, ReconcileEngine, Result, SharedReadinessFlag,
};
use tokio_stream::Stream;

/// One simulated link
#[derive(Debug, Clone)]
struct SimLink {
    up: bool,
    running: bool,
    mac: MacAddress,
    addresses: Vec<IpPrefix>,
    gateway: Option<IpAddr>,
}

/// In-memory adapter for embedded usage
#[derive(Default)]
struct SimAdapter {
    links: Mutex<BTreeMap<String, SimLink>>,
}

impl SimAdapter {
    fn plug(&self, name: &str, mac: [u8; 6]) {
        self.links.lock().unwrap().insert(
            name.to_string(),
            SimLink {
                up: true,
                running: true,
                mac: MacAddress::new(mac),
                addresses: Vec::new(),
                gateway: None,
            },
        );
    }

    fn dump(&self) {
        for (name, link) in self.links.lock().unwrap().iter() {
            let addresses: Vec<String> =
                link.addresses.iter().map(|p| p.to_string()).collect();
            println!(
                "   {}: up={} running={} addresses={:?} gateway={:?}",
                name, link.up, link.running, addresses, link.gateway
            );
        }
    }

    fn with_link<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut SimLink) -> T,
    ) -> std::result::Result<T, ifsync_core::Error> {
        let mut links = self.links.lock().unwrap();
        match links.get_mut(name) {
            Some(link) => Ok(f(link)),
            None => Err(ifsync_core::Error::adapter_unavailable(name)),
        }
    }
}

#[async_trait::async_trait]
impl AdapterControl for SimAdapter {
    async fn interfaces(&self) -> std::result::Result<Vec<String>, ifsync_core::Error> {
        Ok(self.links.lock().unwrap().keys().cloned().collect())
    }

    async fn link_status(
        &self,
        interface: &str,
    ) -> std::result::Result<LinkStatus, ifsync_core::Error> {
        self.with_link(interface, |link| LinkStatus {
            up: link.up,
            running: link.running,
            mac: Some(link.mac),
        })
    }

    async fn addresses(
        &self,
        interface: &str,
    ) -> std::result::Result<Vec<IpPrefix>, ifsync_core::Error> {
        self.with_link(interface, |link| link.addresses.clone())
    }

    async fn add_address(
        &self,
        interface: &str,
        prefix: IpPrefix,
        _broadcast: Option<IpAddr>,
    ) -> std::result::Result<(), ifsync_core::Error> {
        self.with_link(interface, |link| link.addresses.push(prefix))
    }

    async fn remove_address(
        &self,
        interface: &str,
        prefix: IpPrefix,
    ) -> std::result::Result<(), ifsync_core::Error> {
        self.with_link(interface, |link| link.addresses.retain(|p| *p != prefix))
    }

    async fn set_gateway(
        &self,
        interface: &str,
        gateway: IpAddr,
    ) -> std::result::Result<(), ifsync_core::Error> {
        self.with_link(interface, |link| link.gateway = Some(gateway))
    }

    async fn set_link(
        &self,
        interface: &str,
        up: bool,
    ) -> std::result::Result<(), ifsync_core::Error> {
        self.with_link(interface, |link| link.up = up)
    }

    async fn commit(&self, _interface: &str) -> std::result::Result<(), ifsync_core::Error> {
        Ok(())
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = LinkEvent> + Send + 'static>> {
        // The example drives events by calling the engine directly, so
        // the watch stream stays empty.
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }
}

/// Lease client that grants a fixed offer to every interface
struct SimLeaseClient;

#[async_trait::async_trait]
impl LeaseClient for SimLeaseClient {
    async fn request(
        &self,
        interface: &str,
        mac: MacAddress,
        _hint: Option<IpAddr>,
        _timeout: Duration,
        _retries: usize,
    ) -> std::result::Result<LeaseOffer, ifsync_core::Error> {
        println!("[Lease] Granting offer on {} for {}", interface, mac);
        Ok(LeaseOffer {
            address: IpAddr::from([192, 168, 1, 50]),
            prefix_len: 24,
            gateway: Some(IpAddr::from([192, 168, 1, 1])),
            broadcast: Some(IpAddr::from([192, 168, 1, 255])),
            dns_servers: vec![IpAddr::from([192, 168, 1, 1])],
            server: Some(IpAddr::from([192, 168, 1, 1])),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::WARN)
        .init();

    println!("=== Embedded ifsync-core Example ===\n");

    // Create custom components
    let adapter = Arc::new(SimAdapter::default());
    adapter.plug("eth0", [0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    let signal = Arc::new(SharedReadinessFlag::default());

    // Create configuration: one managed dynamic interface, open mode so
    // hotplugged interfaces get adopted, resolver file in a scratch path.
    let mut config = EngineConfig::new();
    config.interfaces.push(InterfaceEntry::new("eth0", Mode::Dynamic));
    config.required.push("eth0".to_string());
    config.open = true;
    config.dns_file = std::env::temp_dir().join("ifsync-demo-resolv.conf");
    config.response_timeout_secs = 1;
    config.lease_retries = 0;

    // Create engine
    println!("1. Creating engine...");
    let (engine, mut event_rx) = ReconcileEngine::new(
        adapter.clone(),
        Arc::new(SimLeaseClient),
        signal.clone(),
        config,
    )?;

    // Spawn event listener
    let event_listener = tokio::spawn(async move {
        println!("2. Event listener started");
        while let Some(event) = event_rx.recv().await {
            println!("[Event] {:?}", event);
        }
        println!("Event listener stopped");
    });

    // Run the configure walk: brings eth0 under management and kicks off
    // its lease request in the background.
    println!("3. Running configure walk...");
    engine.configure().await?;

    // Give the background lease worker a moment to land its offer
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n4. Simulated platform after configure:");
    adapter.dump();
    println!("   readiness: {}", signal.get());

    // Simulate a hotplug: a new interface appears and reports carrier.
    // Open mode means the engine adopts it as a dynamic record.
    println!("\n5. Hotplugging eth1...");
    adapter.plug("eth1", [0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
    engine.on_adapter_event("eth1", true, true).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n6. Simulated platform after hotplug:");
    adapter.dump();

    println!("\n7. Engine records:");
    for record in engine.snapshot().await {
        println!(
            "   {}: mode={:?} lease={:?} address={:?}",
            record.name, record.mode, record.lease_state, record.address
        );
    }

    // Drop our engine handle; the event channel closes once the engine's
    // background tasks finish.
    drop(engine);
    let _ = tokio::time::timeout(Duration::from_millis(200), event_listener).await;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Engine lifecycle is fully controlled by the application");
    println!("- Platform access is injected through traits");
    println!("- No global state, no reliance on process lifecycle");

    Ok(())
}
