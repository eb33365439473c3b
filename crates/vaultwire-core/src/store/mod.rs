//! Secret store clients
//!
//! - `SecretStoreClient` trait: the seam the fetcher reads through
//! - `VaultClient`: HashiCorp Vault over HTTP (KV v1 and v2)
//! - `MemorySecretStore`: versioned in-memory store for tests and embedding

mod traits;
mod memory;
mod vault;

pub use traits::{SecretStoreClient, SecretData, StoreError, StoreResult};
pub use memory::MemorySecretStore;
pub use vault::VaultClient;
