//! Resolved runtime settings.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_INVALID_TTL, DEFAULT_VALID_TTL};
use crate::paapi::{Credentials, PaapiResult, RetryPolicy};

/// Default vendor host for the Japanese marketplace.
pub const DEFAULT_HOST: &str = "webservices.amazon.co.jp";
/// Signing region for the Japanese marketplace.
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_MARKETPLACE: &str = "www.amazon.co.jp";
/// Default cache document filename inside the data directory.
pub const DEFAULT_CACHE_FILENAME: &str = "product-cache.json";
const INVESTIGATIONS_SUBDIR: &str = "investigations";

/// Credential values as collected from config and environment.
///
/// Validation happens in [`Credentials::new`]; this only carries raw input.
#[derive(Clone, Default)]
pub struct CredentialSettings {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub partner_tag: Option<String>,
}

impl CredentialSettings {
    /// Validate into a credential triple.
    pub fn resolve(&self) -> PaapiResult<Credentials> {
        Credentials::new(
            self.access_key.as_deref().unwrap_or_default(),
            self.secret_key.as_deref().unwrap_or_default(),
            self.partner_tag.as_deref().unwrap_or_default(),
        )
    }
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |v: &Option<String>| if v.is_some() { "[set]" } else { "[unset]" };
        f.debug_struct("CredentialSettings")
            .field("access_key", &state(&self.access_key))
            .field("secret_key", &state(&self.secret_key))
            .field("partner_tag", &state(&self.partner_tag))
            .finish()
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    pub host: String,
    pub region: String,
    pub marketplace: String,
    pub credentials: CredentialSettings,
    /// Vendor request ceiling.
    pub requests_per_second: f64,
    /// Total attempts per call, including the first.
    pub max_retries: u32,
    /// Base backoff in milliseconds.
    pub retry_delay_ms: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout: u64,
    /// Stop retrying on authentication failures.
    pub fail_fast_on_auth: bool,
    pub user_agent: String,
    /// Path to the product cache document.
    pub cache_path: PathBuf,
    /// Directory checked for investigation artifacts.
    pub investigations_dir: PathBuf,
    pub investigation_extension: String,
    pub valid_ttl: Duration,
    pub invalid_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        // Platform data dir, falling back to home, then the current directory
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paapi");
        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings rooted at a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            cache_path: data_dir.join(DEFAULT_CACHE_FILENAME),
            investigations_dir: data_dir.join(INVESTIGATIONS_SUBDIR),
            data_dir,
            host: DEFAULT_HOST.to_string(),
            region: DEFAULT_REGION.to_string(),
            marketplace: DEFAULT_MARKETPLACE.to_string(),
            credentials: CredentialSettings::default(),
            requests_per_second: 1.0,
            max_retries: 3,
            retry_delay_ms: 1000,
            request_timeout: 30,
            fail_fast_on_auth: false,
            user_agent: crate::paapi::USER_AGENT.to_string(),
            investigation_extension: "json".to_string(),
            valid_ttl: DEFAULT_VALID_TTL,
            invalid_ttl: DEFAULT_INVALID_TTL,
        }
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(v) = var("AMAZON_ACCESS_KEY") {
            self.credentials.access_key = Some(v);
        }
        if let Some(v) = var("AMAZON_SECRET_KEY") {
            self.credentials.secret_key = Some(v);
        }
        if let Some(v) = var("AMAZON_PARTNER_TAG") {
            self.credentials.partner_tag = Some(v);
        }
        if let Some(v) = var("PAAPI_HOST") {
            self.host = v;
        }
        if let Some(v) = var("PAAPI_REGION") {
            self.region = v;
        }
        if let Some(v) = var("PAAPI_MARKETPLACE") {
            self.marketplace = v;
        }
        if let Some(v) = var("PAAPI_CACHE_PATH") {
            self.cache_path = PathBuf::from(shellexpand::tilde(&v).as_ref());
        }

        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
            .with_fail_fast_on_auth(self.fail_fast_on_auth)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
