//! In-memory secret store

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{SecretData, SecretStoreClient, StoreError, StoreResult};

/// Versioned in-memory secret store
///
/// Each path keeps every version written to it, numbered from 1. Reading
/// version `0` returns the latest one, like Vault KV v2.
///
/// # Thread Safety
///
/// The store uses `RwLock` internally and is safe to use from multiple threads.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    paths: RwLock<HashMap<String, BTreeMap<u64, SecretData>>>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl MemorySecretStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a new version at `path` and return its number
    pub fn put<K, V>(&self, path: &str, entries: impl IntoIterator<Item = (K, V)>) -> u64
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut paths = self.paths.write();
        let versions = paths.entry(path.to_string()).or_default();
        let version = versions.keys().next_back().copied().unwrap_or(0) + 1;
        versions.insert(version, entries.into_iter().collect());
        version
    }

    /// Write (or overwrite) a specific version at `path`
    pub fn put_version<K, V>(
        &self,
        path: &str,
        version: u64,
        entries: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let mut paths = self.paths.write();
        paths
            .entry(path.to_string())
            .or_default()
            .insert(version, entries.into_iter().collect());
    }

    /// Make every read fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `read` calls served so far, including failed ones
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Latest version number at `path`
    pub fn latest_version(&self, path: &str) -> Option<u64> {
        let paths = self.paths.read();
        paths.get(path).and_then(|v| v.keys().next_back().copied())
    }

    /// Drop every stored path
    pub fn clear(&self) {
        self.paths.write().clear();
    }
}

#[async_trait]
impl SecretStoreClient for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self, path: &str, version: u64) -> StoreResult<SecretData> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }

        let paths = self.paths.read();
        let versions = paths.get(path);
        let data = match version {
            0 => versions.and_then(|v| v.values().next_back()),
            n => versions.and_then(|v| v.get(&n)),
        };
        data.cloned().ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
            version,
        })
    }
}
