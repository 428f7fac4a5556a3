// # ifsync-core
//
// Core library for the interface reconciliation engine.
//
// ## Architecture Overview
//
// This library keeps network interface configuration synchronized with
// declared intent:
//
// - **AdapterControl**: Trait over the platform's link/address plumbing
// - **LeaseClient**: Trait for dynamic address negotiation
// - **ReadinessSignal**: Trait carrying the aggregate "network ready" flag
// - **ReconcileEngine**: Core engine that reacts to link events, drives
//   leases, applies static addresses, and reduces reachability
// - **ResolverFile**: Owner-tagged managed section of the resolver file
// - **LeaseStore**: Durable projection of the registry across restarts
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic never shells out or touches
//    netlink; platform work lives behind the adapter and lease traits
// 2. **Event-Driven**: Link events in, engine events out, one lock between
// 3. **Library-First**: The daemon is a thin wiring layer over this crate
// 4. **Idempotency**: Re-applying a correct configuration causes no churn

pub mod traits;
pub mod engine;
pub mod config;
pub mod control;
pub mod error;
pub mod readiness;
pub mod record;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export core types for convenience
pub use traits::{
    AdapterControl, LeaseClient, LeaseOffer, LinkEvent, LinkStatus, ReadinessSignal,
    SharedReadinessFlag,
};
pub use engine::{ConnectionStatus, EngineEvent, ReconcileEngine};
pub use config::{EngineConfig, InterfaceEntry};
pub use control::{ControlReply, ControlRequest, ControlStatus, dispatch};
pub use error::{Error, Result};
pub use record::{InterfaceRecord, LeaseState, Mode};
pub use resolver::ResolverFile;
pub use store::{LeaseStore, StoredLease};
pub use types::{IpPrefix, MacAddress};
