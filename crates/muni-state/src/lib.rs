//! # muni-state: Lifecycle Records
//!
//! ## Records
//!
//! - **Application** (`application.rs`): a citizen's request for a document
//!   category. `UNDER_REVIEW → VERIFIED_AND_APPROVED | REJECTED`, forward
//!   only, plus the issued document link that closes the lifecycle.
//!
//! - **Citizen** (`citizen.rs`): the requester and certificate recipient.
//!   Referenced from applications and documents by id only; callers fetch
//!   the record explicitly when they need the name or email.
//!
//! ## Design
//!
//! Transitions are methods returning `Result`. An invalid transition leaves
//! the record untouched and reports both endpoints.

pub mod application;
pub mod citizen;

pub use application::{Application, ApplicationError, ApplicationStatus};
pub use citizen::Citizen;
