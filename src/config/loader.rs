//! Configuration loading and merging logic.

use std::path::PathBuf;

use super::{Config, Settings};

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory override (--data flag).
    pub data: Option<PathBuf>,
}

/// Load config from the explicit path, or discover one via prefer.
async fn load_file_config(options: &LoadOptions) -> Config {
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Falling back to defaults: {}", e);
                Config::default()
            }
        };
    }

    Config::load().await
}

/// Load settings with explicit options.
///
/// Priority, lowest first: built-in defaults, config file, environment,
/// then the `--data` override. Returns (Settings, Config).
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    let mut settings = settings.with_env_overrides();

    if let Some(ref data) = options.data {
        let data_dir = config.resolve_path(&data.to_string_lossy(), &base_dir);
        let rebased = Settings::with_data_dir(data_dir);
        settings.cache_path = rebased.cache_path;
        settings.investigations_dir = rebased.investigations_dir;
        settings.data_dir = rebased.data_dir;
    }

    tracing::debug!(
        "Settings resolved: cache={}, investigations={}",
        settings.cache_path.display(),
        settings.investigations_dir.display()
    );

    (settings, config)
}
