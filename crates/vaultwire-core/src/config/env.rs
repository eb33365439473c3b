//! Environment variable property source

use std::env;

use super::traits::PropertySource;

/// Property source backed by environment variables
///
/// Dotted keys map to upper-case variable names: `vault.read-timeout` is read
/// from `VAULT_READ_TIMEOUT`. With a prefix, `APP` turns the same key into
/// `APP_VAULT_READ_TIMEOUT`. Empty variables count as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvPropertySource {
    prefix: Option<String>,
}

impl EnvPropertySource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Only read variables starting with `<PREFIX>_`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Environment variable name for a property key
    pub fn var_name(&self, key: &str) -> String {
        let base: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_ascii_uppercase(), base),
            None => base,
        }
    }
}

impl PropertySource for EnvPropertySource {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(self.var_name(key)).ok().filter(|v| !v.is_empty())
    }
}
