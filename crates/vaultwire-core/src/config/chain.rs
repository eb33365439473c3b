//! Chained property source with fallback behavior

use std::sync::Arc;

use super::traits::PropertySource;

/// Tries each source in order and returns the first value found
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vaultwire_core::config::{ChainPropertySource, EnvPropertySource, MemoryPropertySource, PropertySource};
///
/// let defaults = Arc::new(MemoryPropertySource::with_properties([("vault.engine-version", "2")]));
/// let chain = ChainPropertySource::new(vec![Arc::new(EnvPropertySource::new()), defaults]);
/// assert!(chain.has("vault.engine-version"));
/// ```
pub struct ChainPropertySource {
    sources: Vec<Arc<dyn PropertySource>>,
}

impl ChainPropertySource {
    pub fn new(sources: Vec<Arc<dyn PropertySource>>) -> Self {
        Self { sources }
    }

    /// Append a lower-priority source
    pub fn push(&mut self, source: Arc<dyn PropertySource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Arc<dyn PropertySource>] {
        &self.sources
    }

    /// Find which source provides a key
    pub fn find_source(&self, key: &str) -> Option<&Arc<dyn PropertySource>> {
        self.sources.iter().find(|s| s.has(key))
    }
}

impl PropertySource for ChainPropertySource {
    fn name(&self) -> &str {
        "chain"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.get(key))
    }
}
