//! Property source trait and configuration errors

use std::path::PathBuf;
use std::str::FromStr;

/// Errors raised while reading or validating configuration
///
/// All of these surface before any call to the secret store is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Conflicting settings {first} and {second}: {message}")]
    Conflict {
        first: String,
        second: String,
        message: String,
    },

    #[error("Failed to read {key} from {}: {source}", .path.display())]
    Resource {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn conflict(
        first: impl Into<String>,
        second: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            first: first.into(),
            second: second.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A flat namespace of optional string settings
///
/// Keys are dotted names such as `vault.address` or `vault.tls.enabled`.
/// A missing key is never an error; callers fall back to their defaults.
pub trait PropertySource: Send + Sync {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Raw value for `key`, if set
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a key is set
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Typed accessors on top of `PropertySource`
pub trait PropertySourceExt: PropertySource {
    /// Trimmed string value; blank values count as unset
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse a value with `FromStr`
    fn get_parsed<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_string(key) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::invalid(key, format!("'{}': {}", raw, e))),
            None => Ok(None),
        }
    }

    /// Boolean value; accepts true/false, yes/no, on/off and 1/0
    fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        match self.get_string(key) {
            Some(raw) => match raw.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Some(true)),
                "false" | "no" | "off" | "0" => Ok(Some(false)),
                _ => Err(ConfigError::invalid(key, format!("'{}' is not a boolean", raw))),
            },
            None => Ok(None),
        }
    }
}

impl<T: PropertySource + ?Sized> PropertySourceExt for T {}
