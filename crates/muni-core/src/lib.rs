//! # muni-core: Foundational Types for Smart Municipal Services
//!
//! The leaf of the workspace dependency graph. Every other `muni-*` crate
//! depends on it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `CitizenId`, `ApplicationId` and `DocumentId`
//!    are distinct types over `i64`. A document id cannot be passed where an
//!    application id is expected.
//!
//! 2. **Closed category set.** `DocumentCategory` is parsed from text through
//!    [`DocumentCategory::parse`], which returns a `Result`. Invalid input is
//!    a value, not an exception path.
//!
//! 3. **`CanonicalBytes` newtype.** Digest input flows through
//!    `CanonicalBytes::new()` (RFC 8785 JCS). The hash binding of an issued
//!    document is therefore reproducible byte for byte.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision, the
//!    same precision the hash binding is computed at.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `muni-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod category;
pub mod digest;
pub mod error;
pub mod identity;
pub mod prefix;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use category::DocumentCategory;
pub use digest::{ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, MuniError, ValidationError};
pub use identity::{ApplicationId, CitizenId, DocumentId, EmailAddress};
pub use prefix::VerificationPrefix;
pub use temporal::Timestamp;
