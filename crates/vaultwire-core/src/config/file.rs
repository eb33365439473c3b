//! File-based property source (YAML)
//!
//! Nested maps are flattened into dotted keys, so
//!
//! ```yaml
//! vault:
//!   address: https://vault.internal:8200
//!   tls:
//!     enabled: true
//! ```
//!
//! yields `vault.address` and `vault.tls.enabled`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use super::traits::{ConfigError, ConfigResult, PropertySource};

/// Property source loaded once from a YAML file
#[derive(Debug, Clone)]
pub struct FilePropertySource {
    path: PathBuf,
    properties: HashMap<String, String>,
}

impl FilePropertySource {
    /// Load properties from `path`
    ///
    /// A missing file yields an empty source; unreadable or malformed files
    /// are errors.
    pub fn load(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                properties: HashMap::new(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let properties = Self::parse(&content)?;
        Ok(Self { path, properties })
    }

    /// Load the user-level file (`~/.config/vaultwire/config.yaml`)
    pub fn user() -> ConfigResult<Self> {
        Self::load(Self::user_path())
    }

    /// Path of the user-level config file
    pub fn user_path() -> PathBuf {
        // XDG config directory on Linux, ~/Library/Application Support on macOS
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("vaultwire").join("config.yaml")
    }

    /// Parse YAML text into flattened properties
    pub fn parse(content: &str) -> ConfigResult<HashMap<String, String>> {
        let root: Value = serde_yaml::from_str(content)?;
        let mut properties = HashMap::new();
        match root {
            Value::Null => {}
            Value::Mapping(_) => flatten("", &root, &mut properties)?,
            _ => {
                return Err(ConfigError::Other(
                    "config file must contain a mapping at the top level".to_string(),
                ))
            }
        }
        Ok(properties)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) -> ConfigResult<()> {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let segment = scalar_to_string(k).ok_or_else(|| {
                    ConfigError::Other(format!("unsupported key under '{}'", prefix))
                })?;
                let key = if prefix.is_empty() {
                    segment
                } else {
                    format!("{}.{}", prefix, segment)
                };
                flatten(&key, v, out)?;
            }
        }
        Value::Tagged(tagged) => flatten(prefix, &tagged.value, out)?,
        Value::Null => {}
        Value::Sequence(_) => {
            return Err(ConfigError::invalid(prefix, "lists are not supported"));
        }
        scalar => {
            if let Some(s) = scalar_to_string(scalar) {
                out.insert(prefix.to_string(), s);
            }
        }
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl PropertySource for FilePropertySource {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}
