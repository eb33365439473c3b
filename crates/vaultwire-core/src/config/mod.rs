//! Configuration sources and the Vault client configuration
//!
//! Properties are read from a flat key/value namespace:
//! - `MemoryPropertySource`: In-memory for testing
//! - `EnvPropertySource`: Environment variables (`vault.token` → `VAULT_TOKEN`)
//! - `FilePropertySource`: YAML file, nested maps flattened to dotted keys
//! - `ChainPropertySource`: First source that has a key wins
//!
//! `VaultConfig::from_properties` turns those properties into a validated
//! client configuration.

mod traits;
mod memory;
mod env;
mod file;
mod chain;
mod vault;

pub use traits::{PropertySource, PropertySourceExt, ConfigError, ConfigResult};
pub use memory::MemoryPropertySource;
pub use env::EnvPropertySource;
pub use file::FilePropertySource;
pub use chain::ChainPropertySource;
pub use vault::{VaultConfig, TlsConfig, PemSource, EngineVersion, keys, DEFAULT_ADDRESS};
