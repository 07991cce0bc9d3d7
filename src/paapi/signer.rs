//! SigV4-style request signing.
//!
//! The signing key is derived through a four-stage HMAC chain
//! (date -> region -> service -> `aws4_request`) and applied to a
//! string-to-sign built from the canonical request. All emitted request
//! headers are signed.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::credentials::Credentials;
use super::operations::Operation;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SERVICE: &str = "ProductAdvertisingAPI";
pub const TERMINATOR: &str = "aws4_request";
pub const CONTENT_ENCODING: &str = "amz-1.0";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A fully signed request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub url: String,
    /// Header name/value pairs in emission order.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Pure request signer. No I/O, no retries.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

fn hmac(key: &[u8], msg: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(msg.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Timestamp in the `X-Amz-Date` format.
pub fn amz_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%dT%H%M%SZ").to_string()
}

fn date_stamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d").to_string()
}

/// Canonical header block and signed-header list.
///
/// Names are lower-cased and sorted; each header renders as `name:value\n`.
pub fn canonical_headers(headers: &[(&str, &str)]) -> (String, String) {
    let mut normalized: Vec<(String, &str)> = headers
        .iter()
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim()))
        .collect();
    normalized.sort_by(|a, b| a.0.cmp(&b.0));

    let block: String = normalized
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed = normalized
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");
    (block, signed)
}

impl Signer {
    pub fn new(credentials: Credentials, region: &str) -> Self {
        Self {
            credentials,
            region: region.to_string(),
            service: SERVICE.to_string(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn credential_scope(&self, timestamp: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{}/{}",
            date_stamp(timestamp),
            self.region,
            self.service,
            TERMINATOR
        )
    }

    fn signing_key(&self, timestamp: DateTime<Utc>) -> Vec<u8> {
        let k_date = hmac(
            format!("AWS4{}", self.credentials.secret_key()).as_bytes(),
            &date_stamp(timestamp),
        );
        let k_region = hmac(&k_date, &self.region);
        let k_service = hmac(&k_region, &self.service);
        hmac(&k_service, TERMINATOR)
    }

    /// Build the canonical request string.
    pub fn canonical_request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        payload: &str,
    ) -> String {
        let (block, signed) = canonical_headers(headers);
        format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method,
            path,
            block,
            signed,
            sha256_hex(payload.as_bytes())
        )
    }

    /// Compute the `Authorization` header value.
    ///
    /// `headers` must already contain the `x-amz-date` value derived from
    /// `timestamp`; callers generate the timestamp once and reuse it.
    pub fn authorization(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        payload: &str,
        timestamp: DateTime<Utc>,
    ) -> String {
        let canonical = self.canonical_request(method, path, headers, payload);
        let scope = self.credential_scope(timestamp);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date(timestamp),
            scope,
            sha256_hex(canonical.as_bytes())
        );
        let signature = hex::encode(hmac(&self.signing_key(timestamp), &string_to_sign));
        let (_, signed) = canonical_headers(headers);

        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credentials.access_key(),
            scope,
            signed,
            signature
        )
    }

    /// Sign a POST for `operation` against `host`.
    pub fn sign_request(
        &self,
        host: &str,
        operation: Operation,
        body: String,
        timestamp: DateTime<Utc>,
    ) -> SignedRequest {
        let date = amz_date(timestamp);
        let headers = [
            ("content-encoding", CONTENT_ENCODING),
            ("content-type", CONTENT_TYPE),
            ("host", host),
            ("x-amz-date", date.as_str()),
            ("x-amz-target", operation.target()),
        ];
        let authorization =
            self.authorization("POST", operation.path(), &headers, &body, timestamp);

        SignedRequest {
            url: format!("https://{}{}", host, operation.path()),
            headers: vec![
                ("Authorization".to_string(), authorization),
                ("Content-Encoding".to_string(), CONTENT_ENCODING.to_string()),
                ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
                ("Host".to_string(), host.to_string()),
                ("X-Amz-Date".to_string(), date),
                ("X-Amz-Target".to_string(), operation.target().to_string()),
            ],
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer() -> Signer {
        let creds = Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "example-22",
        )
        .unwrap();
        Signer::new(creds, "us-west-2")
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 34, 56).unwrap()
    }

    #[test]
    fn test_canonical_headers_sorted_and_lowercased() {
        let (block, signed) = canonical_headers(&[
            ("X-Amz-Target", "t"),
            ("Host", " example.com "),
            ("content-type", "application/json"),
        ]);
        assert_eq!(
            block,
            "content-type:application/json\nhost:example.com\nx-amz-target:t\n"
        );
        assert_eq!(signed, "content-type;host;x-amz-target");
    }

    #[test]
    fn test_known_signature() {
        let request = signer().sign_request(
            "webservices.amazon.co.jp",
            Operation::GetItems,
            r#"{"ItemIds":["B000000001"]}"#.to_string(),
            timestamp(),
        );

        assert_eq!(
            request.header("authorization"),
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240115/us-west-2/ProductAdvertisingAPI/aws4_request, \
                 SignedHeaders=content-encoding;content-type;host;x-amz-date;x-amz-target, \
                 Signature=3a1d17392bdf0a3ef29a40237f79d29453f99369a47db9b26bbfa797951ab3f1"
            )
        );
        assert_eq!(request.header("x-amz-date"), Some("20240115T123456Z"));
        assert_eq!(request.url, "https://webservices.amazon.co.jp/paapi5/getitems");
    }

    #[test]
    fn test_payload_hash_in_canonical_request() {
        let canonical = signer().canonical_request(
            "POST",
            "/paapi5/getitems",
            &[("host", "webservices.amazon.co.jp")],
            r#"{"ItemIds":["B000000001"]}"#,
        );
        assert!(canonical
            .ends_with("\nbf030a27d2649b69f9fd4dc40a0edd21cfc0899c8a5f977b23190ccf17ebd6ef"));
        assert!(canonical.starts_with("POST\n/paapi5/getitems\n\nhost:"));
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let s = signer();
        let a = s.sign_request("h", Operation::SearchItems, "{}".to_string(), timestamp());
        let b = s.sign_request("h", Operation::SearchItems, "{}".to_string(), timestamp());
        assert_eq!(a, b);

        let later = timestamp() + chrono::Duration::seconds(1);
        let c = s.sign_request("h", Operation::SearchItems, "{}".to_string(), later);
        assert_ne!(a.header("authorization"), c.header("authorization"));
    }
}
