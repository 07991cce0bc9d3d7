//! Shared helper functions for CLI commands.

use std::sync::Arc;

use crate::cache::{FsInvestigationSignal, ProductCache};
use crate::config::Settings;
use crate::paapi::PaapiClient;

/// Open the product cache described by `settings`, loading it from disk.
pub fn open_cache(settings: &Settings) -> anyhow::Result<ProductCache> {
    let signal = FsInvestigationSignal::new(
        &settings.investigations_dir,
        &settings.investigation_extension,
    );
    let cache = ProductCache::open(&settings.cache_path, Arc::new(signal))?
        .with_ttls(settings.valid_ttl, settings.invalid_ttl);
    Ok(cache)
}

/// Build an authenticated client with the cache attached.
pub fn connect(settings: &Settings) -> anyhow::Result<PaapiClient> {
    let credentials = settings.credentials.resolve()?;
    let mut client = PaapiClient::new(settings)?.with_cache(open_cache(settings)?);
    client.authenticate_with(credentials);
    Ok(client)
}

/// Serialize to JSON, optionally pretty-printed.
pub fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}
