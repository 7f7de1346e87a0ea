//! # muni-docs: Document Issuance and Authenticity Verification
//!
//! The pipeline that turns an approved application into a verifiable
//! official document.
//!
//! - **Application Registry** (`registry.rs`): citizens' document requests
//!   and review decisions.
//! - **Document Issuer** (`issuer.rs`): validates an application, derives
//!   the content-bound hash, commits the document.
//! - **Verification Reference Codec** (`reference.rs`): `{prefix}/{id}/{hash}`
//!   encoding and decoding.
//! - **Certificate Renderer** (`certificate.rs`): a PDF page with the
//!   document details and a QR code of the verification reference.
//! - **Authenticity Verifier** (`verify.rs`): constant-time check of a
//!   claimed `(id, hash)` against the stored record.
//! - **Ledger** (`ledger.rs`): the persistence seam and its in-memory
//!   implementation.
//!
//! Records refer to each other by id. The recipient of a document is fetched
//! from the ledger explicitly wherever its name or email is needed.

pub mod certificate;
pub mod document;
pub mod issuer;
pub mod ledger;
pub mod notice;
pub mod reference;
pub mod registry;
pub mod verify;

pub use certificate::{Certificate, CertificateRenderer, RenderError};
pub use document::{Document, HashBinding};
pub use issuer::{CommittedIssuance, DocumentIssuer, IssueError, Issuance};
pub use ledger::{DocumentDraft, IssuanceRecord, Ledger, LedgerError, MemoryLedger};
pub use notice::DeliveryNotice;
pub use reference::{decode_reference, encode_reference, ReferenceError, VerificationReference};
pub use registry::ApplicationRegistry;
pub use verify::{outcome_message, AuthenticityVerifier, AUTHENTIC_MESSAGE, NOT_AUTHENTIC_MESSAGE};
