//! Classification of raw vendor responses.
//!
//! Turns a `VendorResponse` into the items it carries, or into a typed
//! error the retry loop can act on. Item-level "not found" reports are not
//! errors: the caller records them as absent.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::error::{redact, PaapiError, PaapiResult};
use super::transport::VendorResponse;
use crate::normalize::{VendorEnvelope, VendorErrorDetail, VendorItem};

/// Error codes meaning an identifier or query has no matching item.
const NOT_FOUND_CODES: &[&str] = &["ItemNotAccessible", "NoResults", "ItemsNotFound"];

/// Error codes reporting bad or unauthorized credentials.
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedAwsUsers",
    "IncompleteSignature",
    "InvalidAssociate",
    "InvalidPartnerTag",
    "InvalidSignature",
    "UnrecognizedClient",
];

const MAX_MESSAGE_LEN: usize = 300;

/// Identifier-shaped token inside a vendor message.
static IDENTIFIER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z0-9]{10}\b").unwrap());

/// Items parsed from a successful exchange, plus any not-found notices.
#[derive(Debug, Default)]
pub struct VendorOutcome {
    pub items: Vec<VendorItem>,
    pub not_found: Vec<VendorErrorDetail>,
}

impl VendorOutcome {
    /// The subset of `missing` the vendor explicitly reported as absent.
    ///
    /// A notice naming identifiers covers exactly those. A notice naming none
    /// (a request-wide `ItemsNotFound`) covers every missing identifier.
    /// Identifiers with no covering notice are not confirmed absent.
    pub fn confirmed_absent<'a>(&self, missing: &[&'a str]) -> Vec<&'a str> {
        let mut request_wide = false;
        let mut named = HashSet::new();
        for notice in &self.not_found {
            let ids: Vec<&str> = IDENTIFIER_TOKEN
                .find_iter(&notice.message)
                .map(|m| m.as_str())
                .filter(|token| token.bytes().any(|b| b.is_ascii_digit()))
                .collect();
            if ids.is_empty() {
                request_wide = true;
            }
            named.extend(ids);
        }
        missing
            .iter()
            .copied()
            .filter(|id| request_wide || named.contains(id))
            .collect()
    }
}

/// Whether a vendor error means "no such item" rather than a failure.
pub fn is_not_found(error: &VendorErrorDetail) -> bool {
    NOT_FOUND_CODES.contains(&error.code.as_str())
        || (error.code == "InvalidParameterValue" && error.message.contains("ItemId"))
}

fn is_auth_code(code: &str) -> bool {
    AUTH_CODES.contains(&code)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_MESSAGE_LEN).collect();
        format!("{}...", cut)
    }
}

fn describe(errors: &[VendorErrorDetail], body: &str, secrets: &[&str]) -> String {
    let text = match errors.first() {
        Some(e) => format!("{}: {}", e.code, e.message),
        None => body.trim().to_string(),
    };
    truncate(&redact(&text, secrets))
}

/// Classify one vendor response.
///
/// `secrets` are redacted from any vendor text copied into an error.
pub fn classify(response: &VendorResponse, secrets: &[&str]) -> PaapiResult<VendorOutcome> {
    let envelope: Option<VendorEnvelope> = serde_json::from_str(&response.body).ok();
    let errors = envelope
        .as_ref()
        .map(|e| e.errors.as_slice())
        .unwrap_or(&[]);

    if !response.is_success() {
        if !errors.is_empty() && errors.iter().all(is_not_found) {
            debug!(status = response.status, "vendor reported no matching items");
            return Ok(VendorOutcome {
                items: Vec::new(),
                not_found: errors.to_vec(),
            });
        }

        let status = response.status;
        let message = describe(errors, &response.body, secrets);
        if status == 401 || status == 403 || errors.iter().any(|e| is_auth_code(&e.code)) {
            return Err(PaapiError::AuthenticationFailure { status, message });
        }
        if status == 429 || errors.iter().any(|e| e.code == "TooManyRequests") {
            return Err(PaapiError::RateLimitExceeded {
                message,
                retry_after: response.retry_after(),
            });
        }
        if status >= 500 {
            return Err(PaapiError::Server { status, message });
        }
        return Err(PaapiError::Client { status, message });
    }

    let envelope = envelope.ok_or_else(|| {
        PaapiError::Decode(truncate(&redact(
            &format!("unparseable body: {}", response.body.trim()),
            secrets,
        )))
    })?;

    let (not_found, failures): (Vec<VendorErrorDetail>, Vec<VendorErrorDetail>) =
        envelope.errors.into_iter().partition(is_not_found);

    // Any other embedded error fails the whole exchange, even next to items.
    if let Some(first) = failures.first() {
        return Err(PaapiError::VendorPayload {
            code: first.code.clone(),
            message: truncate(&redact(&first.message, secrets)),
        });
    }

    let items: Vec<VendorItem> = match (envelope.items_result, envelope.search_result) {
        (Some(result), _) => result.items,
        (None, Some(result)) => result.items,
        (None, None) if !not_found.is_empty() => Vec::new(),
        (None, None) => {
            return Err(PaapiError::Decode(
                "response carried neither results nor errors".to_string(),
            ))
        }
    };

    Ok(VendorOutcome { items, not_found })
}
