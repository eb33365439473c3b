//! HashiCorp Vault client over the HTTP API
//!
//! Reads are `GET {address}/v1/{path}` with the token in `X-Vault-Token`.
//! For KV v2 the mount is followed by `data/`: with `path-prefix = "kv/apps"`,
//! `kv/apps/billing` is read from `v1/kv/apps/data/billing`. Without a prefix
//! the first path segment is taken as the mount.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, StatusCode};
use serde_json::Value;
use zeroize::{Zeroize, Zeroizing};

use super::traits::{SecretData, SecretStoreClient, StoreError, StoreResult};
use crate::config::{keys, ConfigError, ConfigResult, EngineVersion, TlsConfig, VaultConfig};

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Secret store client for HashiCorp Vault
///
/// # Example
///
/// ```no_run
/// use vaultwire_core::config::{EnvPropertySource, VaultConfig};
/// use vaultwire_core::store::{SecretStoreClient, VaultClient};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = VaultConfig::from_properties(&EnvPropertySource::new())?;
/// let client = VaultClient::new(config)?;
/// let data = client.read("secret/billing", 0).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VaultClient {
    config: VaultConfig,
    client: Client,
}

impl VaultClient {
    /// Create a client, loading any TLS material the configuration points at
    pub fn new(config: VaultConfig) -> ConfigResult<Self> {
        config.validate()?;
        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// API path (relative to the address) for reading `path` at `version`
    pub fn api_path(&self, path: &str, version: u64) -> String {
        let path = path.trim_matches('/');
        match self.config.engine_version {
            EngineVersion::V1 => format!("v1/{}", path),
            EngineVersion::V2 => {
                let mut api = format!(
                    "v1/{}",
                    kv2_data_path(path, self.config.path_prefix.as_deref())
                );
                if version > 0 {
                    api.push_str(&format!("?version={}", version));
                }
                api
            }
        }
    }

    fn url(&self, api_path: &str) -> String {
        format!(
            "{}/{}",
            self.config.address.as_str().trim_end_matches('/'),
            api_path
        )
    }
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl SecretStoreClient for VaultClient {
    fn name(&self) -> &str {
        "vault"
    }

    async fn read(&self, path: &str, version: u64) -> StoreResult<SecretData> {
        let url = self.url(&self.api_path(path, version));

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.token {
            request = request.header(TOKEN_HEADER, token.as_str());
        }
        if let Some(namespace) = &self.config.namespace {
            request = request.header(NAMESPACE_HEADER, namespace);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                path: path.to_string(),
                version,
            }),
            status if status.is_success() => {
                let body: Zeroizing<Vec<u8>> = Zeroizing::new(response.bytes().await?.into());
                let parsed: Value = serde_json::from_slice(&body).map_err(|e| {
                    StoreError::InvalidResponse(format!("failed to decode vault read response: {}", e))
                })?;
                parse_read_response(parsed, self.config.engine_version)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

/// Inserts the KV v2 `data` segment after the mount
fn kv2_data_path(path: &str, prefix: Option<&str>) -> String {
    let mount = prefix
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .filter(|p| path == *p || path.starts_with(&format!("{}/", p)));

    let (mount, rest) = match mount {
        Some(mount) => (mount, path[mount.len()..].trim_start_matches('/')),
        None => path.split_once('/').unwrap_or((path, "")),
    };

    if rest.is_empty() {
        format!("{}/data", mount)
    } else {
        format!("{}/data/{}", mount, rest)
    }
}

/// Moves the key/value blob out of a read response
///
/// KV v1 answers `{"data": {...}}`, KV v2 answers `{"data": {"data": {...}}}`.
/// String values move into the `SecretData` without a copy; other values are
/// kept as their JSON text. Everything left in the response is wiped.
fn parse_read_response(mut body: Value, engine: EngineVersion) -> StoreResult<SecretData> {
    let blob = match engine {
        EngineVersion::V1 => body.get_mut("data").map(Value::take).ok_or_else(|| {
            StoreError::InvalidResponse("response has no data field".to_string())
        }),
        EngineVersion::V2 => body
            .get_mut("data")
            .and_then(|outer| outer.get_mut("data"))
            .map(Value::take)
            .ok_or_else(|| {
                StoreError::InvalidResponse("KV v2 response has no data.data field".to_string())
            }),
    };
    wipe_value(&mut body);

    match blob? {
        Value::Null => Ok(SecretData::new()),
        Value::Object(map) => {
            let mut data = SecretData::new();
            for (key, value) in map {
                match value {
                    Value::String(s) => data.insert(key, s),
                    mut other => {
                        let text = other.to_string();
                        wipe_value(&mut other);
                        data.insert(key, text);
                    }
                }
            }
            Ok(data)
        }
        mut other => {
            wipe_value(&mut other);
            Err(StoreError::InvalidResponse(
                "secret data is not an object".to_string(),
            ))
        }
    }
}

/// Zeroizes every string inside a JSON value
fn wipe_value(value: &mut Value) {
    match value {
        Value::String(s) => s.zeroize(),
        Value::Array(items) => items.iter_mut().for_each(wipe_value),
        Value::Object(map) => map.values_mut().for_each(wipe_value),
        _ => {}
    }
}

fn build_http_client(config: &VaultConfig) -> ConfigResult<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.read_timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = config.open_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(tls) = config.tls.as_ref().filter(|t| t.enabled) {
        builder = configure_tls(builder.use_rustls_tls(), tls)?;
    }
    builder
        .build()
        .map_err(|e| ConfigError::Other(format!("failed to build Vault HTTP client: {}", e)))
}

fn configure_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &TlsConfig,
) -> ConfigResult<reqwest::ClientBuilder> {
    if let Some(pem) = &tls.pem {
        let bytes = pem.load(keys::TLS_PEM_RESOURCE)?;
        let cert = Certificate::from_pem(&bytes)
            .map_err(|e| ConfigError::invalid(keys::TLS_PEM, e.to_string()))?;
        builder = builder.add_root_certificate(cert);
    }

    if let Some(path) = &tls.trust_store {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Resource {
            key: keys::TLS_TRUST_STORE_RESOURCE.to_string(),
            path: path.clone(),
            source,
        })?;
        let certs = Certificate::from_pem_bundle(&bytes)
            .or_else(|_| Certificate::from_der(&bytes).map(|c| vec![c]))
            .map_err(|e| ConfigError::invalid(keys::TLS_TRUST_STORE_RESOURCE, e.to_string()))?;
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    if let (Some(cert), Some(key)) = (&tls.client_pem, &tls.client_key_pem) {
        let mut identity = cert.load(keys::TLS_CLIENT_PEM)?;
        identity.push(b'\n');
        identity.extend_from_slice(&key.load(keys::TLS_CLIENT_KEY_PEM_RESOURCE)?);
        let identity = Identity::from_pem(&identity)
            .map_err(|e| ConfigError::invalid(keys::TLS_CLIENT_PEM, e.to_string()))?;
        builder = builder.identity(identity);
    }

    Ok(builder)
}
