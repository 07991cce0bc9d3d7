//! Vendor API client.
//!
//! Composes the pieces in the order every call takes: the cache is consulted
//! first, misses are batched, each batch runs through retry -> dispatcher ->
//! signer -> transport, the payload is normalized, and the cache records every
//! item found and every identifier the vendor reported as not found.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn, Instrument, Span};

use super::credentials::Credentials;
use super::dispatcher::{interval_for_rate, Dispatcher};
use super::error::{PaapiError, PaapiResult};
use super::operations::{
    GetItemsRequest, Operation, SearchItemsRequest, SearchParams, BROWSE_NODE_RESOURCES,
    MAX_ITEMS_PER_REQUEST, PRODUCT_RESOURCES,
};
use super::response::{classify, VendorOutcome};
use super::retry::{execute_with_retry, RetryPolicy};
use super::signer::Signer;
use super::transport::{ReqwestTransport, Transport};
use crate::cache::ProductCache;
use crate::config::Settings;
use crate::models::{Asin, CanonicalProduct};
use crate::normalize::{normalize_item, BrowseNodeInvestigation};

/// Endpoint and pacing parameters for a client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub host: String,
    pub region: String,
    pub marketplace: String,
    pub requests_per_second: f64,
    pub retry: RetryPolicy,
}

impl From<&Settings> for ClientOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            host: settings.host.clone(),
            region: settings.region.clone(),
            marketplace: settings.marketplace.clone(),
            requests_per_second: settings.requests_per_second,
            retry: settings.retry_policy(),
        }
    }
}

/// Vendor API client with optional product cache.
///
/// Must be created inside a tokio runtime (the dispatcher spawns a task).
pub struct PaapiClient {
    options: ClientOptions,
    signer: Option<Signer>,
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    cache: Option<Arc<Mutex<ProductCache>>>,
    span: Span,
}

impl PaapiClient {
    /// Build a client using the reqwest transport.
    pub fn new(settings: &Settings) -> PaapiResult<Self> {
        let transport = ReqwestTransport::with_user_agent(
            settings.request_timeout(),
            &settings.user_agent,
        )?;
        Ok(Self::with_transport(
            ClientOptions::from(settings),
            Arc::new(transport),
            tracing::info_span!("paapi"),
        ))
    }

    /// Build a client around any transport, logging under `span`.
    pub fn with_transport(options: ClientOptions, transport: Arc<dyn Transport>, span: Span) -> Self {
        let dispatcher = Dispatcher::with_interval(
            interval_for_rate(options.requests_per_second),
            span.clone(),
        );
        Self {
            options,
            signer: None,
            dispatcher,
            transport,
            cache: None,
            span,
        }
    }

    pub fn with_cache(mut self, cache: ProductCache) -> Self {
        self.cache = Some(Arc::new(Mutex::new(cache)));
        self
    }

    /// Shared handle to the cache, if one is attached.
    pub fn cache(&self) -> Option<Arc<Mutex<ProductCache>>> {
        self.cache.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn is_authenticated(&self) -> bool {
        self.signer.is_some()
    }

    /// Validate and install credentials. Must succeed before any fetch.
    ///
    /// On failure any previously installed credentials are dropped.
    pub fn authenticate(
        &mut self,
        access_key: &str,
        secret_key: &str,
        partner_tag: &str,
    ) -> PaapiResult<()> {
        self.signer = None;
        let credentials = Credentials::new(access_key, secret_key, partner_tag)?;
        self.authenticate_with(credentials);
        Ok(())
    }

    pub fn authenticate_with(&mut self, credentials: Credentials) {
        self.signer = Some(Signer::new(credentials, &self.options.region));
        self.span.in_scope(|| debug!("Credentials installed"));
    }

    fn signer(&self) -> PaapiResult<&Signer> {
        self.signer.as_ref().ok_or(PaapiError::MissingCredentials {
            missing: vec!["access_key", "secret_key", "partner_tag"],
        })
    }

    /// One vendor round trip with retries. Each attempt is signed when the
    /// dispatcher starts it, not when it is queued.
    async fn call(&self, operation: Operation, body: String) -> PaapiResult<VendorOutcome> {
        let signer = self.signer()?.clone();
        let secrets: Vec<String> = signer
            .credentials()
            .secrets()
            .iter()
            .map(|s| s.to_string())
            .collect();

        execute_with_retry(&self.options.retry, operation.name(), |attempt| {
            let signer = signer.clone();
            let transport = self.transport.clone();
            let dispatcher = self.dispatcher.clone();
            let host = self.options.host.clone();
            let body = body.clone();
            let secrets = secrets.clone();

            async move {
                debug!("{} attempt {}", operation.name(), attempt);
                let response = dispatcher
                    .enqueue(async move {
                        let request = signer.sign_request(&host, operation, body, Utc::now());
                        transport.send(&request).await
                    })
                    .await??;
                let secrets: Vec<&str> = secrets.iter().map(String::as_str).collect();
                classify(&response, &secrets)
            }
        })
        .instrument(self.span.clone())
        .await
    }

    fn get_items_body(&self, ids: &[String], resources: &[&'static str]) -> PaapiResult<String> {
        let signer = self.signer()?;
        let request = GetItemsRequest::new(
            ids.to_vec(),
            signer.credentials().partner_tag(),
            &self.options.marketplace,
            resources,
        );
        serde_json::to_string(&request).map_err(|e| PaapiError::Decode(e.to_string()))
    }

    /// Fetch one batch (at most ten ids) and record every outcome in the cache.
    async fn fetch_batch(&self, ids: &[String]) -> PaapiResult<HashMap<String, CanonicalProduct>> {
        let body = self.get_items_body(ids, PRODUCT_RESOURCES)?;
        let outcome = self.call(Operation::GetItems, body).await?;

        let requested: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut found = HashMap::new();
        for item in &outcome.items {
            let Some(asin) = Asin::parse(&item.asin) else {
                warn!("Vendor returned unusable identifier {:?}", item.asin);
                continue;
            };
            if !requested.contains(asin.as_str()) {
                debug!("Ignoring unrequested item {}", asin);
                continue;
            }
            found.insert(asin.to_string(), normalize_item(item));
        }
        for notice in &outcome.not_found {
            debug!("Vendor not-found notice {}: {}", notice.code, notice.message);
        }

        let missing: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains_key(*id))
            .collect();
        let absent = outcome.confirmed_absent(&missing);
        for id in missing.iter().filter(|id| !absent.contains(*id)) {
            warn!("{} missing from vendor response without a not-found notice", id);
        }

        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().await;
            for (id, product) in &found {
                cache.set(id, product)?;
            }
            for id in &absent {
                info!("{} not found at vendor", id);
                cache.mark_invalid(id);
            }
            if let Err(e) = cache.save() {
                warn!("Failed to save cache after batch: {}", e);
            }
        }

        Ok(found)
    }

    /// Fetch a single product.
    ///
    /// `Ok(None)` means the item did not come back. Only a vendor not-found
    /// notice records it as absent in the cache. Network and vendor failures
    /// are returned after retries are exhausted.
    pub async fn get_product(&self, id: &str) -> PaapiResult<Option<CanonicalProduct>> {
        self.signer()?;
        let asin = Asin::parse(id).ok_or_else(|| PaapiError::InvalidIdentifier(id.to_string()))?;

        if let Some(cache) = &self.cache {
            let cache = cache.lock().await;
            if let Some(product) = cache.get(asin.as_str()) {
                debug!("Cache hit for {}", asin);
                return Ok(Some(product));
            }
            if cache.is_invalid(asin.as_str()) {
                debug!("{} recently confirmed absent", asin);
                return Ok(None);
            }
        }

        let mut found = self.fetch_batch(&[asin.to_string()]).await?;
        Ok(found.remove(asin.as_str()))
    }

    /// Fetch many products, batched ten per vendor call.
    ///
    /// Cached and recently-absent ids cost no network call. A failing batch
    /// is logged and skipped; its ids are simply missing from the result.
    /// Only when nothing could be resolved and a batch failed is the last
    /// failure returned.
    pub async fn get_products<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> PaapiResult<HashMap<String, CanonicalProduct>> {
        self.signer()?;

        let mut requested = Vec::with_capacity(ids.len());
        for raw in ids {
            match Asin::parse(raw.as_ref()) {
                Some(asin) => requested.push(asin.to_string()),
                None => warn!("Skipping invalid identifier {:?}", raw.as_ref()),
            }
        }

        let mut results = HashMap::new();
        let missing = match &self.cache {
            Some(cache) => {
                let cache = cache.lock().await;
                for id in &requested {
                    if let Some(product) = cache.get(id) {
                        results.insert(id.clone(), product);
                    }
                }
                cache.get_missing(&requested)
            }
            None => {
                let mut seen = HashSet::new();
                requested
                    .iter()
                    .filter(|id| seen.insert(id.as_str()))
                    .cloned()
                    .collect()
            }
        };

        info!(
            "{} requested, {} cached, {} to fetch",
            requested.len(),
            results.len(),
            missing.len()
        );

        let mut last_error = None;
        for (index, batch) in missing.chunks(MAX_ITEMS_PER_REQUEST).enumerate() {
            match self.fetch_batch(batch).await {
                Ok(found) => {
                    debug!("Batch {} resolved {}/{}", index + 1, found.len(), batch.len());
                    results.extend(found);
                }
                Err(e) => {
                    error!("Batch {} ({} ids) failed: {}", index + 1, batch.len(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if results.is_empty() => Err(e),
            _ => Ok(results),
        }
    }

    /// Keyword search. Results are cached; ineligible listings are dropped
    /// unless `params.exclude_ineligible` is false.
    pub async fn search(&self, params: &SearchParams) -> PaapiResult<Vec<CanonicalProduct>> {
        let signer = self.signer()?;
        let request = SearchItemsRequest::from_params(
            params,
            signer.credentials().partner_tag(),
            &self.options.marketplace,
        );
        let body = serde_json::to_string(&request).map_err(|e| PaapiError::Decode(e.to_string()))?;
        let outcome = self.call(Operation::SearchItems, body).await?;

        let products: Vec<CanonicalProduct> = outcome.items.iter().map(normalize_item).collect();

        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().await;
            for product in &products {
                if let Some(asin) = Asin::parse(&product.asin) {
                    cache.set(asin.as_str(), product)?;
                }
            }
            if let Err(e) = cache.save() {
                warn!("Failed to save cache after search: {}", e);
            }
        }

        let total = products.len();
        let products: Vec<CanonicalProduct> = if params.exclude_ineligible {
            products.into_iter().filter(|p| p.is_eligible()).collect()
        } else {
            products
        };
        info!(
            "Search {:?}: {} results, {} eligible",
            params.keywords,
            total,
            products.len()
        );
        Ok(products)
    }

    /// Fetch the raw browse node placement of one item for diagnosis.
    ///
    /// Bypasses the cache; `Ok(None)` when the vendor has no such item.
    pub async fn browse_nodes(&self, id: &str) -> PaapiResult<Option<BrowseNodeInvestigation>> {
        self.signer()?;
        let asin = Asin::parse(id).ok_or_else(|| PaapiError::InvalidIdentifier(id.to_string()))?;
        let body = self.get_items_body(&[asin.to_string()], BROWSE_NODE_RESOURCES)?;
        let outcome = self.call(Operation::GetItems, body).await?;

        Ok(outcome
            .items
            .iter()
            .find(|item| item.asin.eq_ignore_ascii_case(asin.as_str()))
            .map(BrowseNodeInvestigation::from_item))
    }
}
