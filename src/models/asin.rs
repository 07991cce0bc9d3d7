//! Vendor catalog identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of every vendor-assigned identifier.
pub const ASIN_LEN: usize = 10;

/// A validated 10-character alphanumeric catalog key.
///
/// Identifiers are externally assigned and opaque; the only normalization
/// applied is upper-casing so `b0abc12345` and `B0ABC12345` share a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asin(String);

impl Asin {
    /// Parse an identifier, returning `None` if it is not 10 ASCII alphanumerics.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == ASIN_LEN && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(Self(trimmed.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Asin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
