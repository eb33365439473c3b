//! Secret resolution errors

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::types::SecretDescriptor;

/// Errors raised while fetching and registering secrets
///
/// Every variant is fatal to initialization. Handle reads and destruction
/// never fail.
#[derive(Error, Debug)]
pub enum SecretError {
    /// The key is absent from the data stored at that path and version
    #[error("Secret not found: name [{name}], version [{version}], path [{path}]")]
    NotFound {
        name: String,
        version: u64,
        path: String,
    },

    /// Failure reported by the store client, passed through as is
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Malformed or contradictory store configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Initialization was requested a second time
    #[error("Secrets are already initialized")]
    AlreadyInitialized,
}

impl SecretError {
    /// Create a not-found error for a descriptor
    pub fn not_found(descriptor: &SecretDescriptor) -> Self {
        Self::NotFound {
            name: descriptor.name.clone(),
            version: descriptor.version,
            path: descriptor.path.clone(),
        }
    }

    /// Whether this is a missing-key error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type SecretResult<T> = Result<T, SecretError>;
