//! # API Route Modules
//!
//! - `verify`: public authenticity check opened by certificate QR codes.
//! - `documents`: issuance, listing and certificate download.
//! - `applications`: document requests and review decisions.
//! - `citizens`: citizen registration and lookup.

pub mod applications;
pub mod citizens;
pub mod documents;
pub mod verify;
