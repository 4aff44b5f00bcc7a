use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const BASE_URL_ENV: &str = "CONTENTLENS_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Retry tuning for idempotent reads that fail at the network level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    #[serde(default = "RetryPolicy::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "RetryPolicy::default_delay_ms")]
    pub delay_ms: u64,
}

impl RetryPolicy {
    fn default_max_retries() -> u32 {
        1
    }

    fn default_delay_ms() -> u64 {
        300
    }

    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            delay_ms: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::default_max_retries(),
            delay_ms: Self::default_delay_ms(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Always ends with `/` so relative paths join under it.
    pub base_url: Url,
    pub timeout: Duration,
    /// Used for large result pages and file uploads.
    pub extended_timeout: Duration,
    pub retry: RetryPolicy,
    pub storage_dir: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("client configuration invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(detail) => {
                format!("Client not configured: {detail}. Update contentlens.yaml.")
            }
        }
    }
}

impl ClientSettings {
    /// Load from `contentlens.yaml` when present, then apply `.env` and
    /// environment overrides. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let section = match locate_config_file() {
            Some(path) => {
                let contents = fs::read_to_string(&path).map_err(|err| {
                    ConfigError::Invalid(format!("failed to read {}: {err}", path.display()))
                })?;
                let config: ContentLensConfig = serde_yaml::from_str(&contents).map_err(|err| {
                    ConfigError::Invalid(format!("invalid contentlens.yaml: {err}"))
                })?;
                tracing::debug!(path = %path.display(), "loaded client configuration");
                config.client.unwrap_or_default()
            }
            None => ClientSection::default(),
        };
        resolve_client_settings(section, std::env::var(BASE_URL_ENV).ok())
    }

    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        resolve_client_settings(
            ClientSection {
                base_url: Some(base_url.to_owned()),
                ..ClientSection::default()
            },
            None,
        )
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url.trim())?;
        Ok(self)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_storage_dir(mut self, storage_dir: PathBuf) -> Self {
        self.storage_dir = storage_dir;
        self
    }
}

fn resolve_client_settings(
    section: ClientSection,
    env_base_url: Option<String>,
) -> Result<ClientSettings, ConfigError> {
    let raw_base = env_base_url
        .filter(|value| !value.trim().is_empty())
        .or(section.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = parse_base_url(raw_base.trim())?;

    let timeout_ms = section.timeout_ms.unwrap_or(10_000);
    if timeout_ms == 0 {
        return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
    }
    let extended_timeout_ms = section.extended_timeout_ms.unwrap_or(60_000);
    if extended_timeout_ms < timeout_ms {
        return Err(ConfigError::Invalid(
            "extended_timeout_ms must not be shorter than timeout_ms".to_string(),
        ));
    }

    Ok(ClientSettings {
        base_url,
        timeout: Duration::from_millis(timeout_ms),
        extended_timeout: Duration::from_millis(extended_timeout_ms),
        retry: section.retry.unwrap_or_default(),
        storage_dir: section.storage_dir.unwrap_or_else(default_storage_dir),
    })
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw)
        .map_err(|err| ConfigError::Invalid(format!("invalid base_url `{raw}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "base_url must use http or https, got `{}`",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_storage_dir() -> PathBuf {
    match BaseDirs::new() {
        Some(base) => base.data_local_dir().join("contentlens"),
        None => PathBuf::from(".contentlens"),
    }
}

fn locate_config_file() -> Option<PathBuf> {
    config_file_candidates()
        .into_iter()
        .find(|path| path.exists())
}

fn config_file_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("contentlens.yaml")];
    if let Some(base) = BaseDirs::new() {
        let config_dir = base.config_dir().join("contentlens");
        paths.push(config_dir.join("contentlens.yaml"));
        paths.push(config_dir.join("contentlens.yml"));
        paths.push(base.home_dir().join(".contentlens").join("contentlens.yaml"));
    }
    paths
}

#[derive(Debug, Deserialize)]
struct ContentLensConfig {
    client: Option<ClientSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ClientSection {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    extended_timeout_ms: Option<u64>,
    retry: Option<RetryPolicy>,
    storage_dir: Option<PathBuf>,
}
