//! Vendor API credentials.

use std::fmt;

use super::error::{PaapiError, PaapiResult};

/// Access key, secret key and partner tag for the vendor API.
///
/// Validity is checked once, in [`Credentials::new`]; the signer assumes
/// it is handed well-formed credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
    partner_tag: String,
}

impl Credentials {
    /// Validate and build a credential triple.
    ///
    /// Fails with `MissingCredentials` naming (never echoing) every empty component.
    pub fn new(access_key: &str, secret_key: &str, partner_tag: &str) -> PaapiResult<Self> {
        let mut missing = Vec::new();
        if access_key.trim().is_empty() {
            missing.push("access_key");
        }
        if secret_key.trim().is_empty() {
            missing.push("secret_key");
        }
        if partner_tag.trim().is_empty() {
            missing.push("partner_tag");
        }
        if !missing.is_empty() {
            return Err(PaapiError::MissingCredentials { missing });
        }

        Ok(Self {
            access_key: access_key.trim().to_string(),
            secret_key: secret_key.trim().to_string(),
            partner_tag: partner_tag.trim().to_string(),
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn partner_tag(&self) -> &str {
        &self.partner_tag
    }

    /// Values that must never appear in logs or error messages.
    pub(crate) fn secrets(&self) -> [&str; 3] {
        [&self.access_key, &self.secret_key, &self.partner_tag]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &"[redacted]")
            .field("secret_key", &"[redacted]")
            .field("partner_tag", &self.partner_tag.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_triple() {
        let creds = Credentials::new("AKID", "secret", "tag-22").unwrap();
        assert_eq!(creds.access_key(), "AKID");
        assert_eq!(creds.partner_tag(), "tag-22");
    }

    #[test]
    fn test_missing_components_are_named_not_echoed() {
        let err = Credentials::new("AKIDVISIBLE", " ", "").unwrap_err();
        match &err {
            PaapiError::MissingCredentials { missing } => {
                assert_eq!(missing, &vec!["secret_key", "partner_tag"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().contains("AKIDVISIBLE"));
    }

    #[test]
    fn test_debug_redacts() {
        let creds = Credentials::new("AKIDSECRETISH", "topsecret", "tag-22").unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("AKIDSECRETISH"));
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("tag-22"));
    }
}
