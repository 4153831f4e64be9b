use crate::core::error::StorageError;
use crate::core::price::SnapshotWindow;
use crate::core::storage::ObjectUri;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable that overrides `provider.api_key`.
pub const API_KEY_ENV: &str = "NASDAQ_DATA_LINK_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub database: String,
    pub series_prefix: String,
    pub snapshot_date: NaiveDate,
    pub timeout_secs: u64,
    /// Number of fetches in flight. Row order is unaffected.
    pub concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://data.nasdaq.com".to_string(),
            api_key: None,
            database: "ECONOMIST".to_string(),
            series_prefix: "BIGMAC_".to_string(),
            snapshot_date: NaiveDate::from_ymd_opt(2021, 7, 31).unwrap_or_default(),
            timeout_secs: 30,
            concurrency: 1,
        }
    }
}

impl ProviderConfig {
    pub fn window(&self) -> SnapshotWindow {
        SnapshotWindow::new(self.snapshot_date)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Local path or http(s) URL of the `COUNTRY|CODE` file.
    pub location: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        ReferenceConfig {
            location: "https://static.quandl.com/ECONOMIST_Descriptions/economist_country_codes.csv"
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Disk,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub scheme: String,
    pub bucket: String,
    pub key: String,
    /// Root directory for the disk backend.
    pub root: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: StorageBackend::S3,
            scheme: "s3".to_string(),
            bucket: "big-mac-data".to_string(),
            key: "big_mac.csv".to_string(),
            root: None,
            timeout_secs: 60,
        }
    }
}

impl StorageConfig {
    pub fn destination(&self) -> Result<ObjectUri, StorageError> {
        ObjectUri::new(&self.scheme, &self.bucket, &self.key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub topic_name: String,
    pub protocol: String,
    pub endpoint: Option<String>,
    pub subject: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            topic_name: "big-mac-topic".to_string(),
            protocol: "email".to_string(),
            endpoint: None,
            subject: "Big Mac File Upload Notification".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AwsConfig {
    pub region: Option<String>,
    /// Alternate service endpoint, e.g. a local emulator.
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct DatasetConfig {
    /// Append rows recovered by the completeness re-fetch instead of discarding them.
    pub merge_recovered: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub reference: ReferenceConfig,
    pub storage: StorageConfig,
    pub notification: NotificationConfig,
    pub aws: AwsConfig,
    pub dataset: DatasetConfig,
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default().with_env_overrides());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "bigmac", "bigmac")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config.with_env_overrides())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            self.provider.api_key = Some(key);
        }
        self
    }

    /// Rejects settings a run cannot proceed with.
    pub fn validate(&self) -> Result<()> {
        if self.provider.concurrency == 0 {
            bail!("provider.concurrency must be at least 1");
        }
        if self.notification.topic_name.trim().is_empty() {
            bail!("notification.topic_name must not be empty");
        }
        if self
            .notification
            .endpoint
            .as_deref()
            .is_none_or(|e| e.trim().is_empty())
        {
            bail!("notification.endpoint must be set");
        }
        if self.storage.backend == StorageBackend::Disk && self.storage.root.is_none() {
            bail!("storage.root is required for the disk backend");
        }
        self.storage.destination()?;
        Ok(())
    }
}
