use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/patterns/scan";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const ENV_ENDPOINT: &str = "PATTERNSCAN_ENDPOINT";
pub const ENV_API_TOKEN: &str = "PATTERNSCAN_API_TOKEN";

/// Scan endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    pub endpoint: String,
    /// Per-attempt timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Sent as a bearer token when set.
    pub api_token: Option<String>,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_token: None,
        }
    }
}

/// Client configuration, usually read from a TOML file:
///
/// ```toml
/// [patterns]
/// endpoint = "https://scanner.example.com/api/patterns/scan"
/// timeout_ms = 10000
///
/// [retry]
/// max_retries = 3
/// base_delay_ms = 1000
/// max_delay_ms = 5000
/// malformed = "retry"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub patterns: PatternsConfig,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(raw)?;
        config.endpoint_url()?;
        Ok(config)
    }

    /// Applies `PATTERNSCAN_ENDPOINT` and `PATTERNSCAN_API_TOKEN` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                self.patterns.endpoint = endpoint.trim().to_string();
            }
        }
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            if !token.trim().is_empty() {
                self.patterns.api_token = Some(token.trim().to_string());
            }
        }
        self
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.patterns.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.patterns.endpoint.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidEndpoint {
                endpoint: self.patterns.endpoint.clone(),
                reason: format!("unsupported scheme {other:?}"),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.patterns.timeout_ms.max(1))
    }
}
