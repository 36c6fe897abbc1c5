use anyhow::{Context, Result};
use directories::ProjectDirs;
use patternscan::{ClientConfig, PatternsConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "patternscan.toml";
pub const ENV_FEED_ENDPOINT: &str = "PATTERNSCAN_FEED_ENDPOINT";

const DEFAULT_FEED_ENDPOINT: &str = "ws://localhost:8000/ws/patterns";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub endpoint: String,
    pub enabled: bool,
    pub reconnect_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FEED_ENDPOINT.to_string(),
            enabled: true,
            reconnect_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardPrefs {
    /// 0 disables auto-refresh.
    pub auto_refresh_secs: u64,
}

impl Default for DashboardPrefs {
    fn default() -> Self {
        Self {
            auto_refresh_secs: 60,
        }
    }
}

/// Everything read from `patternscan.toml`. The `[patterns]` and `[retry]`
/// tables are the client's own config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub patterns: PatternsConfig,
    pub retry: RetryPolicy,
    pub feed: FeedSettings,
    pub dashboard: DashboardPrefs,
}

impl DashboardSettings {
    /// Reads `path`, or the platform config file when `path` is `None` and
    /// that file exists, then applies environment overrides.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_settings_path().filter(|p| p.exists()),
        };
        let settings = match path {
            Some(p) => {
                let raw = tokio::fs::read_to_string(&p)
                    .await
                    .with_context(|| format!("read settings {:?}", p))?;
                Self::from_toml_str(&raw).with_context(|| format!("parse settings {:?}", p))?
            }
            None => Self::default(),
        };
        Ok(settings.with_env_overrides())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: DashboardSettings = toml::from_str(raw)?;
        settings.client_config().endpoint_url()?;
        Ok(settings)
    }

    pub fn with_env_overrides(mut self) -> Self {
        let client = self.client_config().with_env_overrides();
        self.patterns = client.patterns;
        if let Ok(endpoint) = std::env::var(ENV_FEED_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                self.feed.endpoint = endpoint.trim().to_string();
            }
        }
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            patterns: self.patterns.clone(),
            retry: self.retry,
        }
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "patternscan", "pattern_dash")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn all_tables_parse() {
        let settings = DashboardSettings::from_toml_str(
            r#"
            [patterns]
            endpoint = "https://scanner.example.com/api/patterns/scan"

            [retry]
            max_retries = 2

            [feed]
            endpoint = "wss://scanner.example.com/ws"
            enabled = false

            [dashboard]
            auto_refresh_secs = 15
            "#,
        )
        .unwrap();
        assert_eq!(settings.retry.max_retries, 2);
        assert!(!settings.feed.enabled);
        assert_eq!(settings.feed.reconnect_secs, 3);
        assert_eq!(settings.dashboard.auto_refresh_secs, 15);
        let client = settings.client_config();
        assert_eq!(client.patterns.endpoint, "https://scanner.example.com/api/patterns/scan");
        assert_eq!(client.patterns.timeout_ms, 10_000);
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(DashboardSettings::from_toml_str("[patterns]\nendpoint = \"nope\"").is_err());
    }

    #[tokio::test]
    #[serial]
    async fn load_reads_explicit_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[dashboard]\nauto_refresh_secs = 5\n").unwrap();

        std::env::set_var(ENV_FEED_ENDPOINT, "ws://127.0.0.1:9999/ws");
        let settings = DashboardSettings::load(Some(&path)).await;
        std::env::remove_var(ENV_FEED_ENDPOINT);

        let settings = settings.unwrap();
        assert_eq!(settings.dashboard.auto_refresh_secs, 5);
        assert_eq!(settings.feed.endpoint, "ws://127.0.0.1:9999/ws");
    }

    #[tokio::test]
    #[serial]
    async fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardSettings::load(Some(&dir.path().join("missing.toml")))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("read settings"));
    }
}
