//! In-memory property source

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::PropertySource;

/// In-memory property source for testing and programmatic configuration
#[derive(Debug, Default)]
pub struct MemoryPropertySource {
    properties: RwLock<HashMap<String, String>>,
}

impl MemoryPropertySource {
    /// Create a new empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source with initial properties
    pub fn with_properties<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: RwLock::new(
                properties
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.properties.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.properties.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PropertySource for MemoryPropertySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.properties.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_set_and_remove() {
        let source = MemoryPropertySource::new();
        assert!(source.is_empty());

        source.set("vault.address", "https://vault:8200");
        assert_eq!(source.len(), 1);
        assert!(source.has("vault.address"));

        assert_eq!(source.remove("vault.address"), Some("https://vault:8200".to_string()));
        assert!(!source.has("vault.address"));
    }
}
