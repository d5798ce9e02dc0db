use crate::api::DEFAULT_BASE_URL;
use crate::client::RetryPolicy;
use crate::error::{ExportError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the Raindrop API token
pub const TOKEN_VAR: &str = "RAINDROP_TOKEN";
pub const BASE_URL_VAR: &str = "RAINDROP_BASE_URL";
pub const OUTPUT_DIR_VAR: &str = "RAINDROP_OUTPUT_DIR";

/// Application configuration
///
/// Everything except the API token, which only ever comes from the
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// API root, without trailing slash
    pub base_url: String,
    /// User-agent sent with every request
    pub user_agent: String,
    /// Attempts per request, the first one included
    pub max_retries: u32,
    /// First backoff after a 5xx, doubled per attempt
    pub base_delay_ms: u64,
    /// Wait after a 429
    pub rate_limit_cooldown_ms: u64,
    /// Pause after every successful request
    pub request_delay_ms: u64,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Directory the CSV tables are written to
    pub output_dir: PathBuf,
    /// Concurrent collection exports; 1 keeps everything sequential
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            max_retries: policy.max_retries,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            rate_limit_cooldown_ms: policy.rate_limit_cooldown.as_millis() as u64,
            request_delay_ms: policy.request_delay.as_millis() as u64,
            timeout_secs: 30,
            output_dir: PathBuf::from("."),
            workers: 1,
        }
    }
}

fn default_user_agent() -> String {
    format!("raindump/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from a file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location (~/.config/raindump/config.yml)
    /// Falls back to default config if file doesn't exist
    pub fn load() -> Self {
        let config_path = crate::utils::get_config_dir().join("config.yml");

        if config_path.exists() {
            match Self::load_from_path(&config_path) {
                Ok(config) => {
                    debug!("Loaded config from {:?}", config_path);
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to load config from {:?}: {}; using defaults",
                        config_path, e
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Apply `RAINDROP_BASE_URL` / `RAINDROP_OUTPUT_DIR` overrides
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(dir) = lookup(OUTPUT_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(ExportError::Config("max_retries must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(ExportError::Config("workers must be at least 1".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ExportError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Worker count capped at the number of CPUs
    ///
    /// Workers share the client's pacer, so this bounds requests in flight,
    /// not the request rate.
    pub fn effective_workers(&self) -> usize {
        self.workers.clamp(1, num_cpus::get().max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            rate_limit_cooldown: Duration::from_millis(self.rate_limit_cooldown_ms),
            request_delay: Duration::from_millis(self.request_delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Load `.env` from the working directory, if there is one
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// The API token, required before any network call
pub fn token_from<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(TOKEN_VAR)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ExportError::Config(format!(
                "{} is not set; create a test token at https://app.raindrop.io/settings/integrations",
                TOKEN_VAR
            ))
        })
}

/// Process environment lookup for [`token_from`] and [`Config::apply_env`]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
