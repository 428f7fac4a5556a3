// # Lease Store
//
// Durable JSON cache of each interface's last known configuration.
//
// ## Purpose
//
// Written after every accepted lease and read once at startup, so a restart
// seeds records with the most recent leased addresses instead of falling
// back to cold static defaults until the first negotiation completes.
//
// ## Durability
//
// - Atomic writes: new content goes to a temp file, then renames over the
//   store file, so a crash never leaves a half-written store behind
// - Best-effort reads: a missing or unparseable store is logged and treated
//   as empty, never fatal to startup
//
// ## File Format
//
// ```json
// [
//   {
//     "interface": "eth0",
//     "mode": "dynamic",
//     "address": "192.168.1.120/24",
//     "gateway": "192.168.1.1",
//     "broadcast": "192.168.1.255",
//     "dnsServers": ["192.168.1.1"],
//     "updated": "2025-06-02T10:41:00Z"
//   }
// ]
// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::record::{InterfaceRecord, Mode};
use crate::types::IpPrefix;

/// One persisted interface projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLease {
    /// Interface name
    pub interface: String,
    /// Assignment mode at the time of the write
    pub mode: Mode,
    /// Last known address
    pub address: Option<IpPrefix>,
    /// Last known gateway
    pub gateway: Option<IpAddr>,
    /// Last known broadcast address
    pub broadcast: Option<IpAddr>,
    /// Name servers advertised by the last lease
    pub dns_servers: Vec<IpAddr>,
    /// When this entry was written
    pub updated: DateTime<Utc>,
}

impl StoredLease {
    /// Project a record into its persisted form
    pub fn from_record(record: &InterfaceRecord) -> Self {
        Self {
            interface: record.name.clone(),
            mode: record.mode,
            address: record.address,
            gateway: record.gateway,
            broadcast: record.broadcast,
            dns_servers: record.lease_dns_servers.clone(),
            updated: Utc::now(),
        }
    }
}

/// File-backed lease cache
///
/// Constructed with `None` the store is disabled: loads return empty and
/// saves do nothing, which is how hosts without persistent storage run.
#[derive(Debug, Clone)]
pub struct LeaseStore {
    path: Option<PathBuf>,
}

impl LeaseStore {
    /// Create a store backed by `path`, or a disabled store for `None`
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Create a disabled store
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// True when saves actually persist
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Load the persisted entries, keyed by interface name
    ///
    /// Best-effort: a missing file or a parse failure yields an empty map.
    /// Parse failures are logged; they mean the cache is lost, not that
    /// startup fails.
    pub async fn load(&self) -> HashMap<String, StoredLease> {
        let Some(path) = &self.path else {
            return HashMap::new();
        };

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Lease store does not exist yet: {}", path.display());
                return HashMap::new();
            }
            Err(e) => {
                tracing::warn!("Failed to read lease store {}: {}", path.display(), e);
                return HashMap::new();
            }
        };

        let entries: Vec<StoredLease> = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Lease store {} is unparseable, starting empty: {}",
                    path.display(),
                    e
                );
                return HashMap::new();
            }
        };

        tracing::debug!("Loaded {} lease entries from {}", entries.len(), path.display());
        entries
            .into_iter()
            .map(|entry| (entry.interface.clone(), entry))
            .collect()
    }

    /// Persist `entries`, replacing the store file atomically
    pub async fn save(&self, entries: &[StoredLease]) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;

        // Write to a temporary file first, then rename over the target.
        let temp_path = Self::temp_path(path);
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }
        fs::rename(&temp_path, path).await?;

        tracing::trace!("Lease store written: {}", path.display());
        Ok(())
    }

    fn temp_path(path: &PathBuf) -> PathBuf {
        let mut temp = path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LeaseState;
    use tempfile::tempdir;

    fn leased_record(name: &str, address: &str) -> InterfaceRecord {
        let mut record = InterfaceRecord::new(name, Mode::Dynamic);
        record.address = Some(address.parse().unwrap());
        record.gateway = Some("192.168.1.1".parse().unwrap());
        record.lease_state = LeaseState::Active;
        record.lease_dns_servers.push("192.168.1.1".parse().unwrap());
        record
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leases.json");
        let store = LeaseStore::new(Some(path.clone()));

        let record = leased_record("eth0", "192.168.1.120/24");
        store
            .save(&[StoredLease::from_record(&record)])
            .await
            .unwrap();
        assert!(path.exists());

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        let entry = &loaded["eth0"];
        assert_eq!(entry.mode, Mode::Dynamic);
        assert_eq!(entry.address, Some("192.168.1.120/24".parse().unwrap()));
        assert_eq!(entry.dns_servers.len(), 1);
    }

    #[tokio::test]
    async fn missing_store_loads_empty() {
        let dir = tempdir().unwrap();
        let store = LeaseStore::new(Some(dir.path().join("absent.json")));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_store_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leases.json");
        fs::write(&path, b"not json at all").await.unwrap();

        let store = LeaseStore::new(Some(path));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_store_never_touches_disk() {
        let store = LeaseStore::disabled();
        assert!(!store.is_enabled());

        let record = leased_record("eth0", "10.0.0.2/24");
        store
            .save(&[StoredLease::from_record(&record)])
            .await
            .unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_replaces_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leases.json");
        let store = LeaseStore::new(Some(path.clone()));

        let first = leased_record("eth0", "192.168.1.120/24");
        store.save(&[StoredLease::from_record(&first)]).await.unwrap();

        let second = leased_record("eth1", "10.0.0.9/16");
        store.save(&[StoredLease::from_record(&second)]).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("eth1"));
        // no temp file may linger after the rename
        assert!(!LeaseStore::temp_path(&path).exists());
    }
}
