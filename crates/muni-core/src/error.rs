//! # Error Types
//!
//! Error hierarchy shared across the workspace. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! - Validation errors name the offending field and the rejected value.
//! - Canonicalization errors fail loudly; a document hash is never computed
//!   over partially serialized input.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum MuniError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Timestamp could not be parsed or is not UTC.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Input validation failures for domain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The category name is not one of the closed set.
    #[error("unknown document category: {0:?}")]
    UnknownCategory(String),

    /// A required text field is empty after trimming.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A text field exceeds its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
    },

    /// Identifiers are positive integers.
    #[error("invalid identifier: {0:?}")]
    InvalidId(String),

    /// Email address is not syntactically plausible.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    /// Verification URL prefix is unusable.
    #[error("invalid verification URL prefix {prefix:?}: {reason}")]
    InvalidPrefix {
        /// The rejected prefix.
        prefix: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Trim `value` and check it is non-empty and at most `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}
