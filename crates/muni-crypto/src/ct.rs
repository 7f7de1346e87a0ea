//! # Constant-Time Equality
//!
//! Comparison time must not depend on the position of the first differing
//! byte. Both functions are backed by `subtle::ConstantTimeEq`.
//!
//! Length is not secret for document hashes (always 64 hex characters when
//! genuine), but a length mismatch still runs a dummy comparison of equal
//! length before returning `false`.

use subtle::ConstantTimeEq;

/// Constant-time equality of two byte slices.
pub fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        // Dummy comparison keeps the work proportional to `expected`.
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Constant-time equality of two strings, compared as UTF-8 bytes.
pub fn constant_time_str_eq(provided: &str, expected: &str) -> bool {
    constant_time_eq(provided.as_bytes(), expected.as_bytes())
}
