//! Secret manager: fetcher and registry behind two lifecycle hooks

use std::sync::Arc;

use crate::config::{PropertySource, VaultConfig};
use crate::logging::{NoOpLogger, SharedLogger};
use crate::secrets::{SecretError, SecretFetcher, SecretRegistry, SecretRequest, SecretResult};
use crate::store::{SecretStoreClient, VaultClient};
use crate::{log_error, log_info, log_warn};

/// Where the manager is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Built, nothing fetched yet
    Created,
    /// Every request was fetched and delivered
    Initialized,
    /// Initialization stopped on an error; partial handles are still held
    Failed,
    /// Teardown has run
    ShutDown,
}

/// Bundles a fetcher and a registry behind the init and teardown hooks
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vaultwire_core::config::FilePropertySource;
/// use vaultwire_core::lifecycle::SecretManager;
/// use vaultwire_core::logging::ConsoleLogger;
/// use vaultwire_core::secrets::{SecretRequest, SecretSlot};
/// use vaultwire_core::types::SecretDescriptor;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let properties = FilePropertySource::user()?;
/// let mut manager = SecretManager::from_properties(&properties, Arc::new(ConsoleLogger::new()))?;
///
/// let db_password = SecretSlot::new();
/// manager
///     .initialize(vec![SecretRequest::for_slot(
///         SecretDescriptor::latest("secret/billing", "db-password"),
///         &db_password,
///     )])
///     .await?;
///
/// // ... run the application, reading through `db_password` ...
///
/// manager.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct SecretManager {
    fetcher: SecretFetcher,
    registry: SecretRegistry,
    logger: SharedLogger,
    state: ManagerState,
}

impl SecretManager {
    /// Create a manager reading through `client`
    pub fn new(client: Arc<dyn SecretStoreClient>, logger: SharedLogger) -> Self {
        Self {
            fetcher: SecretFetcher::with_logger(client, logger.clone()),
            registry: SecretRegistry::with_logger(logger.clone()),
            logger,
            state: ManagerState::Created,
        }
    }

    /// Create a manager with a silent logger
    pub fn with_client(client: Arc<dyn SecretStoreClient>) -> Self {
        Self::new(client, Arc::new(NoOpLogger::new()))
    }

    /// Build a `VaultClient` from properties and wrap it
    ///
    /// Configuration problems surface here, before any network call.
    pub fn from_properties(source: &dyn PropertySource, logger: SharedLogger) -> SecretResult<Self> {
        let config = VaultConfig::from_properties(source)?;
        log_info!(
            logger,
            "Using Vault at {} (KV {:?})",
            config.address,
            config.engine_version
        );
        let client = VaultClient::new(config)?;
        Ok(Self::new(Arc::new(client), logger))
    }

    /// Init hook: fetch and deliver every requested secret
    ///
    /// May run once. On failure the manager moves to `Failed`; the handles
    /// created before the failure are still destroyed by `shutdown`.
    pub async fn initialize<I>(&mut self, requests: I) -> SecretResult<()>
    where
        I: IntoIterator<Item = SecretRequest>,
    {
        if self.state != ManagerState::Created {
            log_warn!(self.logger, "Ignoring initialize in state {:?}", self.state);
            return Err(SecretError::AlreadyInitialized);
        }

        match self.registry.register_all(&self.fetcher, requests).await {
            Ok(()) => {
                self.state = ManagerState::Initialized;
                Ok(())
            }
            Err(err) => {
                log_error!(self.logger, "Secret initialization failed: {}", err);
                self.state = ManagerState::Failed;
                Err(err)
            }
        }
    }

    /// Teardown hook: destroy every handle, newest first
    ///
    /// Runs in any state and is idempotent. Returns how many handles were
    /// cleared by this call.
    pub fn shutdown(&mut self) -> usize {
        let cleared = self.registry.destroy_all();
        self.state = ManagerState::ShutDown;
        cleared
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn registry(&self) -> &SecretRegistry {
        &self.registry
    }

    pub fn fetcher(&self) -> &SecretFetcher {
        &self.fetcher
    }
}
