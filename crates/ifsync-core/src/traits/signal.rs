// # Readiness Signal Trait
//
// The "network ready" flag the rest of the host system observes. The engine
// writes the freshly computed value after every reconciliation pass
// (level-triggered); listeners that care about edges subscribe to the
// engine's event channel instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for the system-wide readiness flag
pub trait ReadinessSignal: Send + Sync {
    /// Publish a readiness value
    fn set(&self, ready: bool);

    /// Read the last published value
    fn get(&self) -> bool;
}

/// In-process readiness flag
///
/// Default implementation for hosts without an external subsystem registry;
/// clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct SharedReadinessFlag {
    ready: Arc<AtomicBool>,
}

impl SharedReadinessFlag {
    /// Create a flag that starts out not-ready
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadinessSignal for SharedReadinessFlag {
    fn set(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    fn get(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
