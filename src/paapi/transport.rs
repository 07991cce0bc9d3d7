//! HTTP transport for signed vendor requests.
//!
//! The transport is a trait so the client can be driven by a scripted
//! responder in tests; production uses reqwest with rustls.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::error::{PaapiError, PaapiResult};
use super::signer::SignedRequest;

/// Default user agent for vendor requests.
pub const USER_AGENT: &str = concat!("paapi-access/", env!("CARGO_PKG_VERSION"));

/// Raw vendor response: status, lower-cased headers and the body text.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl VendorResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the Retry-After header as a wait duration.
    pub fn retry_after(&self) -> Option<Duration> {
        parse_retry_after(self.headers.get("retry-after").map(|s| s.as_str()))
    }
}

/// Parse Retry-After header value (seconds).
/// Returns duration to wait, or None if header is missing/invalid.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Sends one signed request and returns the raw response.
///
/// Implementations report transport-level failures (DNS, timeout, TLS) as
/// `PaapiError::Network`; HTTP status handling belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &SignedRequest) -> PaapiResult<VendorResponse>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the given request timeout.
    pub fn new(timeout: Duration) -> PaapiResult<Self> {
        Self::with_user_agent(timeout, USER_AGENT)
    }

    pub fn with_user_agent(timeout: Duration, user_agent: &str) -> PaapiResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| PaapiError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn extract_response_headers(response: &reqwest::Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &SignedRequest) -> PaapiResult<VendorResponse> {
        let mut builder = self.client.post(&request.url).body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let start = std::time::Instant::now();
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = extract_response_headers(&response);
        let body = response.text().await?;

        debug!(
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes = body.len(),
            "vendor response received"
        );

        Ok(VendorResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("5")), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(Some("600")), Some(Duration::from_secs(60)));
        assert_eq!(parse_retry_after(Some("soon")), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_response_helpers() {
        let response = VendorResponse::new(429, "{}").with_header("Retry-After", "2");
        assert!(!response.is_success());
        assert_eq!(response.retry_after(), Some(Duration::from_secs(2)));
        assert!(VendorResponse::new(204, "").is_success());
    }
}
