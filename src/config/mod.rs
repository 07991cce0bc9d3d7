//! Configuration management using the prefer crate.

mod loader;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use loader::{load_settings_with_options, LoadOptions};
pub use settings::{
    CredentialSettings, Settings, DEFAULT_CACHE_FILENAME, DEFAULT_HOST, DEFAULT_MARKETPLACE,
    DEFAULT_REGION,
};

/// Errors from reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Configuration file structure.
///
/// Secrets are deliberately absent: access and secret keys come from the
/// environment only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Vendor API host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Signing region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,
    /// Associates partner tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<f64>,
    /// Total attempts per vendor call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Base retry backoff in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast_on_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Product cache document path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
    /// Directory holding investigation artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigations_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation_extension: Option<String>,
    /// Lifetime of valid entries, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_ttl_secs: Option<u64>,
    /// Lifetime of invalid entries under investigation, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_ttl_secs: Option<u64>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers paapi config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("paapi").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config file: {}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// TOML when the extension says so, JSON otherwise.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?,
            _ => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// Paths starting with ~ are expanded.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            let data_dir = self.resolve_path(data_dir, base_dir);
            let rebased = Settings::with_data_dir(data_dir);
            settings.cache_path = rebased.cache_path;
            settings.investigations_dir = rebased.investigations_dir;
            settings.data_dir = rebased.data_dir;
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(ref region) = self.region {
            settings.region = region.clone();
        }
        if let Some(ref marketplace) = self.marketplace {
            settings.marketplace = marketplace.clone();
        }
        if let Some(ref tag) = self.partner_tag {
            settings.credentials.partner_tag = Some(tag.clone());
        }
        if let Some(rps) = self.requests_per_second {
            if rps.is_finite() && rps > 0.0 {
                settings.requests_per_second = rps;
            } else {
                tracing::warn!("Ignoring non-positive requests_per_second: {}", rps);
            }
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries.max(1);
        }
        if let Some(delay) = self.retry_delay_ms {
            settings.retry_delay_ms = delay;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(fail_fast) = self.fail_fast_on_auth {
            settings.fail_fast_on_auth = fail_fast;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(ref cache_path) = self.cache_path {
            settings.cache_path = self.resolve_path(cache_path, base_dir);
        }
        if let Some(ref dir) = self.investigations_dir {
            settings.investigations_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref ext) = self.investigation_extension {
            settings.investigation_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(secs) = self.valid_ttl_secs {
            settings.valid_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = self.invalid_ttl_secs {
            settings.invalid_ttl = Duration::from_secs(secs);
        }
    }
}
