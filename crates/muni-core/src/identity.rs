//! # Identity Types
//!
//! Integer-backed identifier newtypes. Ids are assigned sequentially by the
//! persistence layer starting at 1, so only positive values are valid.
//!
//! Each id is a distinct type. Mixing them up is a compile error.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw value. Returns `None` unless it is positive.
            pub fn new(raw: i64) -> Option<Self> {
                (raw > 0).then_some(Self(raw))
            }

            /// Parse a positive decimal integer. Surrounding whitespace,
            /// signs and leading `+` are rejected.
            pub fn parse(s: &str) -> Result<Self, ValidationError> {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ValidationError::InvalidId(s.to_string()));
                }
                s.parse::<i64>()
                    .ok()
                    .and_then(Self::new)
                    .ok_or_else(|| ValidationError::InvalidId(s.to_string()))
            }

            /// The raw integer value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

integer_id!(
    /// Identifies a registered citizen (requester and document recipient).
    CitizenId
);

integer_id!(
    /// Identifies a document application.
    ApplicationId
);

integer_id!(
    /// Identifies an issued document.
    DocumentId
);

/// A syntactically plausible email address, trimmed.
///
/// Only the shape is checked: exactly one `@`, non-empty local part, and a
/// domain containing no whitespace. Deliverability is the mail relay's
/// problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Maximum accepted length in characters.
    pub const MAX_LEN: usize = 254;

    /// Validate and wrap an email address.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        let invalid = || ValidationError::InvalidEmail(s.to_string());
        if trimmed.chars().count() > Self::MAX_LEN || trimmed.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let mut parts = trimmed.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(invalid()),
        }
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<EmailAddress> for String {
    fn from(e: EmailAddress) -> Self {
        e.0
    }
}
