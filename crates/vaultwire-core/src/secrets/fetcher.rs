//! Descriptor resolution against a secret store

use std::sync::Arc;

use zeroize::Zeroizing;

use super::error::{SecretError, SecretResult};
use crate::logging::{NoOpLogger, SharedLogger};
use crate::log_debug;
use crate::store::SecretStoreClient;
use crate::types::SecretDescriptor;

/// Resolves descriptors to secret values
///
/// The rest of the data blob read from the store is wiped as soon as the
/// requested key has been taken out of it.
pub struct SecretFetcher {
    client: Arc<dyn SecretStoreClient>,
    logger: SharedLogger,
}

impl SecretFetcher {
    pub fn new(client: Arc<dyn SecretStoreClient>) -> Self {
        Self::with_logger(client, Arc::new(NoOpLogger::new()))
    }

    pub fn with_logger(client: Arc<dyn SecretStoreClient>, logger: SharedLogger) -> Self {
        Self { client, logger }
    }

    /// The store client this fetcher reads through
    pub fn client(&self) -> &Arc<dyn SecretStoreClient> {
        &self.client
    }

    /// Fetch the value a descriptor points at
    ///
    /// Fails with `SecretError::NotFound` when the key is missing from the
    /// blob. Store failures come back as `SecretError::Store` unchanged.
    pub async fn fetch(&self, descriptor: &SecretDescriptor) -> SecretResult<Zeroizing<String>> {
        log_debug!(
            self.logger,
            "Reading {} from store '{}'",
            descriptor,
            self.client.name()
        );
        let mut data = self
            .client
            .read(&descriptor.path, descriptor.version)
            .await?;

        data.take(&descriptor.name)
            .ok_or_else(|| SecretError::not_found(descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLogger;
    use crate::store::{MemorySecretStore, StoreError};

    fn store() -> Arc<MemorySecretStore> {
        let store = Arc::new(MemorySecretStore::new());
        store.put("p1", [("k1", "x"), ("k2", "y")]);
        store.put("p1", [("k1", "x2")]);
        store
    }

    #[tokio::test]
    async fn test_fetch_present_key() {
        let fetcher = SecretFetcher::new(store());

        let value = fetcher.fetch(&SecretDescriptor::new("p1", "k2", 1)).await.unwrap();
        assert_eq!(value.as_str(), "y");

        let latest = fetcher.fetch(&SecretDescriptor::latest("p1", "k1")).await.unwrap();
        assert_eq!(latest.as_str(), "x2");
    }

    #[tokio::test]
    async fn test_fetch_missing_key() {
        let fetcher = SecretFetcher::new(store());

        // k2 exists at version 1 only
        let err = fetcher
            .fetch(&SecretDescriptor::new("p1", "k2", 2))
            .await
            .unwrap_err();
        match err {
            SecretError::NotFound { name, version, path } => {
                assert_eq!(name, "k2");
                assert_eq!(version, 2);
                assert_eq!(path, "p1");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_errors_pass_through() {
        let store = store();
        store.set_unavailable(true);
        let fetcher = SecretFetcher::new(store);

        let err = fetcher
            .fetch(&SecretDescriptor::new("p1", "k1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_path_is_store_error() {
        let fetcher = SecretFetcher::new(store());
        let err = fetcher
            .fetch(&SecretDescriptor::new("nowhere", "k1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_fetch_never_logs_values() {
        let store = store();
        store.put("p2", [("token", "s.0123456789")]);
        let logger = Arc::new(MemoryLogger::new());
        let fetcher = SecretFetcher::with_logger(store, logger.clone());

        let token = fetcher.fetch(&SecretDescriptor::new("p2", "token", 1)).await.unwrap();
        assert_eq!(token.as_str(), "s.0123456789");
        assert!(logger.contains("name [token], version [1], path [p2]"));
        assert!(!logger.contains("s.0123456789"));
    }
}
