//! # Verification URL Prefix
//!
//! The single externally configured string every verification reference is
//! built on. Validated once at startup and then used verbatim.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated base URL for verification references.
///
/// # Invariants
///
/// - Starts with `http://` or `https://` and has a non-empty host part.
/// - No trailing `/`.
/// - No query (`?`), fragment (`#`) or whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationPrefix(String);

impl VerificationPrefix {
    /// Validate a prefix. Surrounding whitespace and trailing slashes are
    /// removed.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason| ValidationError::InvalidPrefix {
            prefix: s.to_string(),
            reason,
        };
        let trimmed = s.trim().trim_end_matches('/');
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| invalid("must start with http:// or https://"))?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(invalid("missing host"));
        }
        if trimmed.contains(['?', '#']) {
            return Err(invalid("must not contain a query or fragment"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid("must not contain whitespace"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The development default: the API's own verify route on `localhost`.
    pub fn localhost(port: u16) -> Self {
        Self(format!("http://localhost:{port}/v1/documents/verify"))
    }

    /// The prefix as a string slice, without trailing slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VerificationPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for VerificationPrefix {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VerificationPrefix {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VerificationPrefix> for String {
    fn from(p: VerificationPrefix) -> Self {
        p.0
    }
}
