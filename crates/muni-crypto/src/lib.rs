//! # muni-crypto: Cryptographic Primitives
//!
//! - **SHA-256 digest computation** from [`CanonicalBytes`](muni_core::CanonicalBytes),
//!   producing [`ContentDigest`](muni_core::ContentDigest) values. Raw byte
//!   slices are not accepted.
//! - **Constant-time equality** for comparing document hashes and bearer
//!   secrets on unauthenticated paths.

pub mod ct;
pub mod sha256;

// Re-export primary functions.
pub use ct::{constant_time_eq, constant_time_str_eq};
pub use sha256::sha256_digest;
