//! Secret descriptor type

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one secret value inside the secret store
///
/// A descriptor is the `(path, name, version)` triple: `path` locates the
/// data blob in the store, `name` is the key inside that blob, and `version`
/// selects the stored revision. The meaning of `version` belongs to the store;
/// for Vault KV v2, `0` reads the latest revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretDescriptor {
    /// Location of the data blob in the store
    pub path: String,
    /// Key within the data blob
    pub name: String,
    /// Store-specific revision
    #[serde(default)]
    pub version: u64,
}

impl SecretDescriptor {
    /// Create a new descriptor
    pub fn new(path: impl Into<String>, name: impl Into<String>, version: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            version,
        }
    }

    /// Descriptor for the latest revision of a secret
    pub fn latest(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(path, name, 0)
    }
}

impl fmt::Display for SecretDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name [{}], version [{}], path [{}]",
            self.name, self.version, self.path
        )
    }
}
