//! Vaultwire Core
//!
//! Secrets fetched from a store at startup, held in handles that can be read
//! any number of times and destroyed exactly once, and torn down in reverse
//! registration order at shutdown.
//!
//! ## Lifecycle
//!
//! ```rust,ignore
//! use vaultwire_core::{SecretManager, SecretRequest, SecretSlot, SecretDescriptor};
//!
//! let mut manager = SecretManager::from_properties(&properties, logger)?;
//!
//! let api_key = SecretSlot::new();
//! manager.initialize(vec![
//!     SecretRequest::for_slot(SecretDescriptor::latest("secret/app", "api-key"), &api_key),
//! ]).await?;
//!
//! // Readers see the value until shutdown, then None
//! api_key.read(|v| v.map(str::len));
//!
//! manager.shutdown();
//! ```

pub mod types;
pub mod secrets;
pub mod store;
pub mod logging;
pub mod config;
pub mod lifecycle;

// Re-export commonly used types
pub use types::SecretDescriptor;

pub use secrets::{
    SecretError, SecretResult,
    SecretHandle, SecretRef,
    SecretFetcher, SecretRegistry, SecretRequest, SecretSlot,
};

pub use store::{
    SecretStoreClient, SecretData, StoreError, StoreResult,
    MemorySecretStore, VaultClient,
};

pub use config::{
    PropertySource, PropertySourceExt, ConfigError, ConfigResult,
    MemoryPropertySource, EnvPropertySource, FilePropertySource, ChainPropertySource,
    VaultConfig, TlsConfig, EngineVersion,
};

pub use logging::{Logger, LogLevel, SharedLogger, NoOpLogger, ConsoleLogger};

pub use lifecycle::{SecretManager, ManagerState};
