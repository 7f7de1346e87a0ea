//! # SHA-256 Digest Computation
//!
//! Computes [`ContentDigest`] values from [`CanonicalBytes`]. This is the
//! only digest path in the workspace.
//!
//! The function signature requires `CanonicalBytes`, not `&[u8]`, so every
//! digest was computed over delimited canonical JSON.

use muni_core::{CanonicalBytes, ContentDigest, DigestAlgorithm};
use sha2::{Digest, Sha256};

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash: [u8; 32] = Sha256::digest(data.as_bytes()).into();
    ContentDigest::new(DigestAlgorithm::Sha256, hash)
}
