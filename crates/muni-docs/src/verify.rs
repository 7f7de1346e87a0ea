//! # Authenticity Verifier
//!
//! The public check behind the verification URL. Given a claimed
//! `(id, hash)` it answers `true` or `false` and nothing else: absent ids,
//! blank hashes, unknown documents and mismatches all collapse to `false`
//! so callers cannot tell which check failed.
//!
//! The hash comparison is constant-time in the position of the first
//! differing byte.

use muni_core::DocumentId;
use muni_crypto::constant_time_str_eq;

use crate::ledger::Ledger;

/// Message returned alongside a successful verification.
pub const AUTHENTIC_MESSAGE: &str = "Document is authentic and verified.";

/// Message returned alongside a failed verification.
pub const NOT_AUTHENTIC_MESSAGE: &str =
    "Document verification failed. This document may be fraudulent.";

/// Canned message for a verification outcome.
pub fn outcome_message(is_authentic: bool) -> &'static str {
    if is_authentic {
        AUTHENTIC_MESSAGE
    } else {
        NOT_AUTHENTIC_MESSAGE
    }
}

/// Compare a stored hash to a claimed one. The claim is trimmed; an empty
/// claim or an empty stored hash never matches.
pub fn hash_matches(stored: &str, claimed: &str) -> bool {
    let claimed = claimed.trim();
    if claimed.is_empty() || stored.is_empty() {
        return false;
    }
    constant_time_str_eq(claimed, stored)
}

/// Read-only verification over a ledger.
#[derive(Debug)]
pub struct AuthenticityVerifier<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> AuthenticityVerifier<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Whether document `id` exists and carries `claimed_hash`. Total:
    /// never errors and never panics.
    pub fn verify(&self, id: Option<DocumentId>, claimed_hash: &str) -> bool {
        let Some(id) = id else {
            return false;
        };
        if claimed_hash.trim().is_empty() {
            return false;
        }
        self.ledger
            .document(id)
            .is_some_and(|document| hash_matches(&document.document_hash, claimed_hash))
    }
}
