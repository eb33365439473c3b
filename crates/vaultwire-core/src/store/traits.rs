//! Core trait and types for secret store clients

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Errors raised by a secret store client
///
/// The fetcher passes these through untouched.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Nothing stored at {path} (version {version})")]
    NotFound { path: String, version: u64 },

    #[error("Store not available: {0}")]
    Unavailable(String),

    #[error("Invalid response from store: {0}")]
    InvalidResponse(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value data blob read from one store path
///
/// Values are wiped when the blob is dropped. `Debug` shows keys only.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct SecretData {
    entries: HashMap<String, String>,
}

impl SecretData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(mut old) = self.entries.insert(key.into(), value.into()) {
            old.zeroize();
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Move one value out of the blob
    pub fn take(&mut self, key: &str) -> Option<Zeroizing<String>> {
        self.entries.remove(key).map(Zeroizing::new)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = SecretData::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

impl From<HashMap<String, String>> for SecretData {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl Drop for SecretData {
    fn drop(&mut self) {
        for value in self.entries.values_mut() {
            value.zeroize();
        }
    }
}

impl fmt::Debug for SecretData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("SecretData").field("keys", &keys).finish()
    }
}

/// Client for an external secret store
///
/// Implementations own transport, authentication, TLS and retries. The
/// fetcher only ever calls `read`.
///
/// # Example
///
/// ```
/// use vaultwire_core::store::{MemorySecretStore, SecretStoreClient};
///
/// # tokio_test_block(async {
/// let store = MemorySecretStore::new();
/// store.put("secret/app", [("db-password", "hunter2")]);
///
/// let data = store.read("secret/app", 0).await.unwrap();
/// assert_eq!(data.get("db-password"), Some("hunter2"));
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
/// # }
/// ```
#[async_trait]
pub trait SecretStoreClient: Send + Sync {
    /// Human-readable name of this client
    fn name(&self) -> &str;

    /// Read the data blob stored at `path`, at `version`
    ///
    /// The meaning of `version` is store-specific; `0` asks for the latest.
    async fn read(&self, path: &str, version: u64) -> StoreResult<SecretData>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_data_take() {
        let mut data: SecretData = [("user", "admin"), ("password", "hunter2")]
            .into_iter()
            .collect();
        assert_eq!(data.len(), 2);

        let password = data.take("password").unwrap();
        assert_eq!(password.as_str(), "hunter2");
        assert!(!data.contains_key("password"));
        assert!(data.take("password").is_none());
        assert_eq!(data.get("user"), Some("admin"));
    }

    #[test]
    fn test_secret_data_debug_hides_values() {
        let data: SecretData = [("token", "s.abcdef")].into_iter().collect();
        let debug = format!("{:?}", data);
        assert!(debug.contains("token"));
        assert!(!debug.contains("s.abcdef"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Status {
            path: "secret/app".to_string(),
            status: 403,
            body: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "Store returned 403 for secret/app: permission denied");
    }
}
