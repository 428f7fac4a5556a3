//! Core reconciliation engine
//!
//! The ReconcileEngine keeps every managed interface's address configuration
//! synchronized with its record:
//! - Reacting to link/administrative events from the adapter layer
//! - Driving lease negotiation for dynamic interfaces
//! - Applying static assignments idempotently
//! - Maintaining the resolver file's managed section and the lease store
//! - Reducing per-interface reachability into the readiness signal
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐  LinkEvent   ┌──────────────────┐
//! │ AdapterControl│─────────────▶│                  │
//! └───────────────┘              │ ReconcileEngine  │──▶ Events (notify)
//! ┌───────────────┐  LeaseOffer  │  (one lock over  │
//! │  LeaseClient  │─────────────▶│   the registry)  │──▶ ReadinessSignal
//! └───────────────┘              └──────────────────┘
//!                                    │          │
//!                                    ▼          ▼
//!                              ┌──────────┐ ┌────────────┐
//!                              │LeaseStore│ │ResolverFile│
//!                              └──────────┘ └────────────┘
//! ```
//!
//! ## Locking discipline
//!
//! One mutex guards the registry and the last published readiness value.
//! Every public operation holds it for its whole mutation phase, including
//! the adapter calls that apply configuration, and releases it before any
//! event leaves the engine. A listener that synchronously calls back into
//! the engine therefore cannot deadlock.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::readiness;
use crate::record::{InterfaceRecord, LeaseState, Mode};
use crate::resolver::ResolverFile;
use crate::store::{LeaseStore, StoredLease};
use crate::traits::{AdapterControl, LeaseClient, LeaseOffer, ReadinessSignal};
use crate::types::IpPrefix;

/// Whether a connection event announces a new record or a change to one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The interface was just adopted into the registry
    Created,
    /// An existing record changed state
    Updated,
}

/// Events emitted by the engine
///
/// Emitted only after the registry lock has been released, so handlers may
/// call back into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A record was created or transitioned
    ConnectionChanged {
        interface: String,
        status: ConnectionStatus,
    },

    /// An address was applied to the live interface
    AddressAssigned {
        interface: String,
        address: IpPrefix,
    },

    /// Every address was removed from the live interface
    AddressesCleared { interface: String },

    /// Lease negotiation ended in failure; any prior address is retained
    LeaseFailed { interface: String },

    /// The aggregate readiness value changed
    ReadinessChanged { ready: bool },
}

/// State behind the engine lock
struct EngineState {
    registry: BTreeMap<String, InterfaceRecord>,
    published_ready: Option<bool>,
    started: bool,
}

struct EngineShared {
    adapter: Arc<dyn AdapterControl>,
    leases: Arc<dyn LeaseClient>,
    signal: Arc<dyn ReadinessSignal>,
    store: LeaseStore,
    resolver: ResolverFile,
    config: EngineConfig,
    state: Mutex<EngineState>,
    event_tx: mpsc::Sender<EngineEvent>,
}

/// Interface reconciliation engine
///
/// Cheap to clone; all clones share the same registry and capabilities.
///
/// ## Lifecycle
///
/// 1. Create with [`ReconcileEngine::new()`]
/// 2. Run one-time setup with [`ReconcileEngine::configure()`]
/// 3. Feed adapter events into [`ReconcileEngine::on_adapter_event()`]
///    (the daemon forwards the adapter's watch stream)
/// 4. Drop all clones to tear down; records are never removed earlier
#[derive(Clone)]
pub struct ReconcileEngine {
    shared: Arc<EngineShared>,
}

impl ReconcileEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `adapter`: adapter control implementation
    /// - `leases`: lease protocol implementation
    /// - `signal`: system readiness flag
    /// - `config`: engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events
    pub fn new(
        adapter: Arc<dyn AdapterControl>,
        leases: Arc<dyn LeaseClient>,
        signal: Arc<dyn ReadinessSignal>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let store = LeaseStore::new(config.store_path.clone());
        let resolver = ResolverFile::new(config.dns_file.clone(), &config.owner);

        let engine = Self {
            shared: Arc::new(EngineShared {
                adapter,
                leases,
                signal,
                store,
                resolver,
                config,
                state: Mutex::new(EngineState {
                    registry: BTreeMap::new(),
                    published_ready: None,
                    started: false,
                }),
                event_tx: tx,
            }),
        };

        Ok((engine, rx))
    }

    /// One-time setup
    ///
    /// Seeds the registry from configuration and the lease store (a stored
    /// entry wins over the config entry, being newer information), makes
    /// sure the resolver file exists, walks the adapter to bring down
    /// interfaces up or reconcile running ones immediately, and, in open
    /// mode, adopts every unlisted interface. After this returns the engine
    /// accepts events; calling it twice is an error.
    pub async fn configure(&self) -> Result<()> {
        let mut pending = Vec::new();
        {
            let mut state = self.shared.state.lock().await;
            if state.started {
                return Err(Error::config("Engine already configured"));
            }

            if let Err(e) = self
                .shared
                .resolver
                .ensure_exists(&self.shared.config.dns_servers)
                .await
            {
                warn!("Could not create resolver file: {}", e);
            }

            let stored = self.shared.store.load().await;

            for entry in &self.shared.config.interfaces {
                let record = match stored.get(&entry.interface) {
                    Some(saved) => {
                        debug!(
                            "Seeding {} from the lease store (saved {})",
                            entry.interface, saved.updated
                        );
                        let mut record = InterfaceRecord::new(entry.interface.clone(), saved.mode);
                        record.address = saved.address;
                        record.gateway = saved.gateway;
                        record.broadcast = saved.broadcast;
                        if record.mode == Mode::Dynamic && record.address.is_some() {
                            record.lease_state = LeaseState::Expired;
                        }
                        record
                    }
                    None => InterfaceRecord::from_entry(entry),
                };
                state.registry.insert(record.name.clone(), record);
            }

            let known = match self.shared.adapter.interfaces().await {
                Ok(names) => names,
                Err(e) => {
                    warn!("Adapter enumeration failed: {}", e);
                    Vec::new()
                }
            };

            if self.shared.config.open {
                for name in &known {
                    if !state.registry.contains_key(name) {
                        info!("Adopting unlisted interface {} (open mode)", name);
                        state
                            .registry
                            .insert(name.clone(), InterfaceRecord::new(name.clone(), Mode::Dynamic));
                        pending.push(EngineEvent::ConnectionChanged {
                            interface: name.clone(),
                            status: ConnectionStatus::Created,
                        });
                    }
                }
            }

            state.started = true;

            // First pass over everything configured: absent interfaces wait
            // for their hotplug event, down interfaces get brought up so the
            // resulting link event reconciles them, running interfaces are
            // reconciled right away.
            let names: Vec<String> = state.registry.keys().cloned().collect();
            for name in names {
                if !known.contains(&name) {
                    warn!("Interface {} is configured but not present", name);
                    continue;
                }
                match self.shared.adapter.link_status(&name).await {
                    Ok(status) if !status.up => {
                        info!("Bringing {} up", name);
                        if let Err(e) = self.shared.adapter.set_link(&name, true).await {
                            warn!("Could not bring {} up: {}", name, e);
                        }
                    }
                    Ok(status) if status.running => {
                        if let Err(e) = self.clear_addresses(&name).await {
                            warn!("Could not clear {} before reconciling: {}", name, e);
                        }
                        self.reconcile_record(&mut state, &name, &mut pending).await;
                    }
                    Ok(_) => {
                        // up but no carrier yet, the link event will arrive
                    }
                    Err(e) => {
                        warn!("Could not query {}: {}", name, e);
                    }
                }
            }

            // No lease can be active yet, so this publishes the static
            // servers into the managed section at every boot.
            let servers = self.resolver_servers(&state);
            if let Err(e) = self.shared.resolver.rewrite(&servers).await {
                warn!("Could not publish resolver servers: {}", e);
            }

            self.recompute_readiness(&mut state, &mut pending).await;

            info!(
                "Configured with {} interfaces ({} required, open={})",
                state.registry.len(),
                self.shared.config.required.len(),
                self.shared.config.open
            );
        }
        self.emit_all(pending);
        Ok(())
    }

    /// Handle a link or administrative state change
    ///
    /// Unknown interfaces are adopted as default-dynamic records in open
    /// mode and ignored otherwise. A transition to running re-derives the
    /// MAC and reconciles (lease request or static re-apply); a loss of
    /// carrier clears the interface's addresses and voids its lease.
    pub async fn on_adapter_event(&self, name: &str, up: bool, running: bool) -> Result<()> {
        let mut pending = Vec::new();
        {
            let mut state = self.shared.state.lock().await;
            if !state.started {
                return Err(Error::NotStarted);
            }

            let status = if state.registry.contains_key(name) {
                ConnectionStatus::Updated
            } else {
                if !self.shared.config.open {
                    debug!("Ignoring event for unmanaged interface {}", name);
                    return Ok(());
                }
                info!("Adopting interface {} (open mode)", name);
                state
                    .registry
                    .insert(name.to_string(), InterfaceRecord::new(name, Mode::Dynamic));
                ConnectionStatus::Created
            };

            debug!("Link event on {}: up={} running={}", name, up, running);
            pending.push(EngineEvent::ConnectionChanged {
                interface: name.to_string(),
                status,
            });

            if running {
                self.reconcile_record(&mut state, name, &mut pending).await;
            } else {
                self.handle_link_loss(&mut state, name, &mut pending).await;
            }
        }
        self.emit_all(pending);
        Ok(())
    }

    /// Handle a successfully negotiated lease
    ///
    /// Applies the offer to the live interface (replacing prior addresses),
    /// marks the lease active, rewrites the resolver section, persists the
    /// registry, and recomputes readiness. Offers for unknown interfaces
    /// are errors; offers for interfaces that became static while the
    /// negotiation ran are discarded.
    pub async fn on_lease_accepted(&self, name: &str, offer: LeaseOffer) -> Result<()> {
        let mut pending = Vec::new();
        let mut result = Ok(());
        {
            let mut state = self.shared.state.lock().await;
            if !state.started {
                return Err(Error::NotStarted);
            }

            let mode = match state.registry.get(name) {
                Some(record) => record.mode,
                None => {
                    warn!("Lease accepted for unknown interface {}", name);
                    return Err(Error::unknown_interface(name));
                }
            };
            if mode == Mode::Static {
                warn!("Discarding lease for {}: interface is static", name);
                return Ok(());
            }

            let prefix = offer.prefix()?;
            info!(
                "Lease accepted on {}: {} (gateway {:?}, {} DNS servers)",
                name,
                prefix,
                offer.gateway,
                offer.dns_servers.len()
            );

            match self
                .apply_address(name, prefix, offer.gateway, offer.broadcast, true)
                .await
            {
                Ok(()) => {
                    if let Some(record) = state.registry.get_mut(name) {
                        record.address = Some(prefix);
                        record.gateway = offer.gateway;
                        record.broadcast = offer.broadcast;
                        record.lease_state = LeaseState::Active;
                        record.lease_dns_servers = offer.dns_servers.clone();
                    }
                    pending.push(EngineEvent::AddressAssigned {
                        interface: name.to_string(),
                        address: prefix,
                    });

                    let servers = self.resolver_servers(&state);
                    if let Err(e) = self.shared.resolver.rewrite(&servers).await {
                        warn!("Resolver update failed, continuing: {}", e);
                    }

                    let entries: Vec<StoredLease> =
                        state.registry.values().map(StoredLease::from_record).collect();
                    if let Err(e) = self.shared.store.save(&entries).await {
                        warn!("Lease store update failed, continuing: {}", e);
                    }

                    self.recompute_readiness(&mut state, &mut pending).await;
                }
                Err(e) => {
                    error!("Failed to apply leased address {} on {}: {}", prefix, name, e);
                    if let Some(record) = state.registry.get_mut(name) {
                        record.lease_state = LeaseState::Failed;
                    }
                    pending.push(EngineEvent::LeaseFailed {
                        interface: name.to_string(),
                    });
                    result = Err(e);
                }
            }
        }
        self.emit_all(pending);
        result
    }

    /// Handle a failed lease negotiation
    ///
    /// Marks the record failed and notifies. The previously applied address
    /// stays in place: stale beats none.
    pub async fn on_lease_failed(&self, name: &str) {
        let mut pending = Vec::new();
        {
            let mut state = self.shared.state.lock().await;
            if !state.started {
                return;
            }
            match state.registry.get_mut(name) {
                Some(record) if record.mode == Mode::Dynamic => {
                    warn!("Lease negotiation failed on {}", name);
                    record.lease_state = LeaseState::Failed;
                    pending.push(EngineEvent::LeaseFailed {
                        interface: name.to_string(),
                    });
                }
                Some(_) => debug!("Ignoring lease failure for static interface {}", name),
                None => warn!("Lease failure for unknown interface {}", name),
            }
        }
        self.emit_all(pending);
    }

    /// Re-lease or re-apply a registered interface on operator request
    ///
    /// `dynamic` selects the treatment: `true` issues a fresh lease request
    /// (switching a static record to dynamic mode first), `false` applies
    /// the record's address statically and voids any lease progress.
    pub async fn reconfigure(&self, name: &str, dynamic: bool) -> Result<()> {
        let mut pending = Vec::new();
        let mut result = Ok(());
        {
            let mut state = self.shared.state.lock().await;
            if !state.started {
                return Err(Error::NotStarted);
            }
            if !state.registry.contains_key(name) {
                return Err(Error::unknown_interface(name));
            }

            let status = self
                .shared
                .adapter
                .link_status(name)
                .await
                .map_err(|_| Error::adapter_unavailable(format!("{} is not present", name)))?;
            if !status.running {
                return Err(Error::adapter_unavailable(format!("{} is not running", name)));
            }

            if dynamic {
                let Some(mac) = status.mac else {
                    return Err(Error::adapter_unavailable(format!(
                        "{} has no hardware address",
                        name
                    )));
                };
                if let Some(record) = state.registry.get_mut(name) {
                    record.mac = Some(mac);
                    if record.mode == Mode::Static {
                        info!("Switching {} to dynamic addressing", name);
                        record.mode = Mode::Dynamic;
                    }
                }
                self.start_lease(&mut state, name);
            } else {
                let (prefix, gateway, broadcast) = {
                    let Some(record) = state.registry.get_mut(name) else {
                        return Err(Error::unknown_interface(name));
                    };
                    record.mac = status.mac;
                    let Some(prefix) = record.address else {
                        return Err(Error::config(format!("{} has no address to assign", name)));
                    };
                    record.lease_state = LeaseState::None;
                    record.lease_dns_servers.clear();
                    (prefix, record.gateway, record.broadcast)
                };

                info!("Re-applying {} on {}", prefix, name);
                match self.apply_address(name, prefix, gateway, broadcast, true).await {
                    Ok(()) => pending.push(EngineEvent::AddressAssigned {
                        interface: name.to_string(),
                        address: prefix,
                    }),
                    Err(e) => result = Err(e),
                }
                self.recompute_readiness(&mut state, &mut pending).await;
            }
        }
        self.emit_all(pending);
        result
    }

    /// Bring the link administratively up or down
    pub async fn set_link(&self, name: &str, up: bool) -> Result<()> {
        let state = self.shared.state.lock().await;
        if !state.started {
            return Err(Error::NotStarted);
        }
        if !state.registry.contains_key(name) {
            return Err(Error::unknown_interface(name));
        }
        info!("Setting {} administratively {}", name, if up { "up" } else { "down" });
        self.shared.adapter.set_link(name, up).await
    }

    /// Remove every address from the interface and reset its record
    pub async fn flush(&self, name: &str) -> Result<()> {
        let mut pending = Vec::new();
        let result;
        {
            let mut state = self.shared.state.lock().await;
            if !state.started {
                return Err(Error::NotStarted);
            }
            if !state.registry.contains_key(name) {
                return Err(Error::unknown_interface(name));
            }

            info!("Flushing all addresses from {}", name);
            result = self.clear_addresses(name).await;
            if let Some(record) = state.registry.get_mut(name) {
                record.reset();
            }
            pending.push(EngineEvent::AddressesCleared {
                interface: name.to_string(),
            });
            self.recompute_readiness(&mut state, &mut pending).await;
        }
        self.emit_all(pending);
        result
    }

    /// Immutable copy of the whole registry
    ///
    /// Never touches the adapter; the copies carry the last observed state.
    pub async fn snapshot(&self) -> Vec<InterfaceRecord> {
        let state = self.shared.state.lock().await;
        state.registry.values().cloned().collect()
    }

    /// Immutable copy of one record
    pub async fn snapshot_one(&self, name: &str) -> Result<InterfaceRecord> {
        let state = self.shared.state.lock().await;
        state
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_interface(name))
    }

    /// Reconcile one record after a transition to running
    ///
    /// Refreshes the MAC, then dispatches on mode: dynamic records get a
    /// lease worker, static records get their address re-applied.
    async fn reconcile_record(
        &self,
        state: &mut EngineState,
        name: &str,
        pending: &mut Vec<EngineEvent>,
    ) {
        let (mode, prefix, gateway, broadcast) = {
            let Some(record) = state.registry.get_mut(name) else {
                return;
            };
            match self.shared.adapter.link_status(name).await {
                Ok(status) => record.mac = status.mac,
                Err(e) => warn!("Could not refresh link status for {}: {}", name, e),
            }
            (record.mode, record.address, record.gateway, record.broadcast)
        };

        match mode {
            Mode::Dynamic => self.start_lease(state, name),
            Mode::Static => match prefix {
                Some(prefix) => {
                    match self.apply_address(name, prefix, gateway, broadcast, true).await {
                        Ok(()) => pending.push(EngineEvent::AddressAssigned {
                            interface: name.to_string(),
                            address: prefix,
                        }),
                        Err(e) => {
                            error!("Failed to apply static address {} on {}: {}", prefix, name, e)
                        }
                    }
                }
                None => warn!("Static interface {} has no address to apply", name),
            },
        }

        self.recompute_readiness(state, pending).await;
    }

    /// Handle loss of carrier: clear what we applied and void the lease
    async fn handle_link_loss(
        &self,
        state: &mut EngineState,
        name: &str,
        pending: &mut Vec<EngineEvent>,
    ) {
        info!("Interface {} lost its link, clearing addresses", name);
        if let Err(e) = self.clear_addresses(name).await {
            warn!("Failed to clear addresses on {}: {}", name, e);
        }
        if let Some(record) = state.registry.get_mut(name) {
            record.void_lease();
            record.reachable = false;
        }
        pending.push(EngineEvent::AddressesCleared {
            interface: name.to_string(),
        });
        self.recompute_readiness(state, pending).await;
    }

    /// Spawn a lease worker for `name` unless one is already pending
    ///
    /// The worker calls back into [`Self::on_lease_accepted`] or
    /// [`Self::on_lease_failed`] when the negotiation settles. An outer
    /// deadline slightly above the client's whole budget guarantees
    /// termination even against a misbehaving client.
    fn start_lease(&self, state: &mut EngineState, name: &str) {
        let Some(record) = state.registry.get_mut(name) else {
            return;
        };
        if record.lease_state == LeaseState::Pending {
            debug!("Lease negotiation already pending on {}", name);
            return;
        }
        let Some(mac) = record.mac else {
            warn!("No hardware address on {}, deferring lease request", name);
            return;
        };

        let hint = record.address.map(|prefix| prefix.address());
        record.lease_state = LeaseState::Pending;
        debug!("Requesting lease on {} (mac {}, hint {:?})", name, mac, hint);

        let engine = self.clone();
        let interface = name.to_string();
        let timeout = Duration::from_secs(self.shared.config.response_timeout_secs);
        let retries = self.shared.config.lease_retries;
        let budget = timeout * (retries as u32 + 1) + Duration::from_secs(1);

        tokio::spawn(async move {
            let outcome = tokio::time::timeout(
                budget,
                engine
                    .shared
                    .leases
                    .request(&interface, mac, hint, timeout, retries),
            )
            .await;

            match outcome {
                Ok(Ok(offer)) => {
                    if let Err(e) = engine.on_lease_accepted(&interface, offer).await {
                        error!("Could not apply accepted lease on {}: {}", interface, e);
                    }
                }
                Ok(Err(e)) => {
                    warn!("Lease request on {} failed: {}", interface, e);
                    engine.on_lease_failed(&interface).await;
                }
                Err(_) => {
                    warn!("Lease request on {} exceeded its whole budget", interface);
                    engine.on_lease_failed(&interface).await;
                }
            }
        });
    }

    /// Apply one address to the live interface
    ///
    /// With `clear_old`, existing same-family addresses are removed in
    /// enumeration order and the desired address is added only if absent,
    /// so re-applying a correct configuration causes no churn. Gateway and
    /// broadcast are applied only when supplied.
    async fn apply_address(
        &self,
        name: &str,
        prefix: IpPrefix,
        gateway: Option<IpAddr>,
        broadcast: Option<IpAddr>,
        clear_old: bool,
    ) -> Result<()> {
        let existing = self.shared.adapter.addresses(name).await?;

        let mut add_needed = true;
        for current in existing {
            if !current.same_family(&prefix) {
                continue;
            }
            if current == prefix {
                add_needed = false;
            } else if clear_old {
                debug!("Removing superseded address {} from {}", current, name);
                if let Err(e) = self.shared.adapter.remove_address(name, current).await {
                    warn!("Failed to remove {} from {}: {}", current, name, e);
                }
            }
        }

        if add_needed {
            self.shared
                .adapter
                .add_address(name, prefix, broadcast)
                .await?;
        }
        if let Some(gateway) = gateway {
            self.shared.adapter.set_gateway(name, gateway).await?;
        }
        self.shared.adapter.commit(name).await?;
        Ok(())
    }

    /// Remove every address (both families) from the interface
    async fn clear_addresses(&self, name: &str) -> Result<()> {
        let existing = self.shared.adapter.addresses(name).await?;
        for prefix in existing {
            if let Err(e) = self.shared.adapter.remove_address(name, prefix).await {
                warn!("Failed to remove {} from {}: {}", prefix, name, e);
            }
        }
        self.shared.adapter.commit(name).await
    }

    /// The resolver list: static servers first, then every active lease's
    /// servers in registry order, de-duplicated preserving insertion order
    fn resolver_servers(&self, state: &EngineState) -> Vec<IpAddr> {
        let mut servers: Vec<IpAddr> = Vec::new();
        for server in &self.shared.config.dns_servers {
            if !servers.contains(server) {
                servers.push(*server);
            }
        }
        for record in state.registry.values() {
            if record.has_active_lease() {
                for server in &record.lease_dns_servers {
                    if !servers.contains(server) {
                        servers.push(*server);
                    }
                }
            }
        }
        servers
    }

    /// Refresh each record's reachability from the adapter and publish
    ///
    /// The signal always receives the freshly computed value; the change
    /// event fires only on a transition.
    async fn recompute_readiness(&self, state: &mut EngineState, pending: &mut Vec<EngineEvent>) {
        for record in state.registry.values_mut() {
            let reachable = match self.shared.adapter.link_status(&record.name).await {
                Ok(status) if status.running => {
                    match self.shared.adapter.addresses(&record.name).await {
                        Ok(addresses) => readiness::is_reachable(true, &addresses),
                        Err(_) => false,
                    }
                }
                _ => false,
            };
            record.reachable = reachable;
        }

        let ready = readiness::evaluate(&state.registry, &self.shared.config.required);
        self.shared.signal.set(ready);

        if state.published_ready != Some(ready) {
            state.published_ready = Some(ready);
            info!("Network readiness is now {}", ready);
            pending.push(EngineEvent::ReadinessChanged { ready });
        }
    }

    fn emit_all(&self, events: Vec<EngineEvent>) {
        for event in events {
            self.emit_event(event);
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging a warning if the channel is full
        if let Err(_) = self.shared.event_tx.try_send(event) {
            warn!("Event channel full, dropping engine event");
        }
    }
}
