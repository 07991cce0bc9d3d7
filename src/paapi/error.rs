//! Error taxonomy for vendor API access.

use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheError;

/// Result type for vendor API operations.
pub type PaapiResult<T> = Result<T, PaapiError>;

/// Errors from the vendor API access layer.
///
/// Messages never carry credential values; vendor-supplied text is redacted
/// before it is placed in a variant.
#[derive(Debug, Error)]
pub enum PaapiError {
    #[error("PA-API credentials are not configured (missing: {})", .missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },

    #[error("Invalid product identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Authentication failed (HTTP {status}): {message}")]
    AuthenticationFailure { status: u16, message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request rejected (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    #[error("Vendor reported error {code}: {message}")]
    VendorPayload { code: String, message: String },

    #[error("Failed to decode vendor response: {0}")]
    Decode(String),

    #[error("PA-API request failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<PaapiError>,
    },

    #[error("Request dispatcher has shut down")]
    DispatcherClosed,

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl PaapiError {
    /// Whether the retry loop may try again after this error.
    ///
    /// Authentication failures are retried unless `fail_fast_on_auth` is set.
    pub fn is_retryable(&self, fail_fast_on_auth: bool) -> bool {
        match self {
            Self::MissingCredentials { .. }
            | Self::InvalidIdentifier(_)
            | Self::RetriesExhausted { .. }
            | Self::DispatcherClosed
            | Self::Cache(_) => false,
            Self::AuthenticationFailure { .. } => !fail_fast_on_auth,
            Self::RateLimitExceeded { .. }
            | Self::Network(_)
            | Self::Server { .. }
            | Self::Client { .. }
            | Self::VendorPayload { .. }
            | Self::Decode(_) => true,
        }
    }

    /// Vendor-requested wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Unwrap a terminal retry error down to the last underlying error.
    pub fn root(&self) -> &PaapiError {
        match self {
            Self::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }
}

impl From<reqwest::Error> for PaapiError {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL; it never carries secrets here but keeps messages short.
        PaapiError::Network(e.without_url().to_string())
    }
}

/// Replace every occurrence of the given secrets in `text` with `[redacted]`.
pub fn redact(text: &str, secrets: &[&str]) -> String {
    let mut out = text.to_string();
    for secret in secrets.iter().filter(|s| !s.is_empty()) {
        out = out.replace(secret, "[redacted]");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_names_fields_only() {
        let err = PaapiError::MissingCredentials {
            missing: vec!["secret_key", "partner_tag"],
        };
        assert_eq!(
            err.to_string(),
            "PA-API credentials are not configured (missing: secret_key, partner_tag)"
        );
        assert!(!err.is_retryable(false));
    }

    #[test]
    fn test_auth_retry_policy() {
        let err = PaapiError::AuthenticationFailure {
            status: 401,
            message: "InvalidSignature".to_string(),
        };
        assert!(err.is_retryable(false));
        assert!(!err.is_retryable(true));
    }

    #[test]
    fn test_exhausted_wraps_last_message() {
        let err = PaapiError::RetriesExhausted {
            attempts: 3,
            last: Box::new(PaapiError::Server {
                status: 503,
                message: "Service Unavailable".to_string(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempt(s)"));
        assert!(msg.contains("Service Unavailable"));
        assert!(matches!(err.root(), PaapiError::Server { status: 503, .. }));
    }

    #[test]
    fn test_redact() {
        let text = "The Access Key ID AKIDEXAMPLE or partner tag mytag-22 is invalid";
        assert_eq!(
            redact(text, &["AKIDEXAMPLE", "mytag-22", ""]),
            "The Access Key ID [redacted] or partner tag [redacted] is invalid"
        );
    }
}
