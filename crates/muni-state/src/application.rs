//! # Application Lifecycle
//!
//! ```text
//! UNDER_REVIEW ──▶ VERIFIED_AND_APPROVED ──▶ (document issued, closed)
//!      │
//!      └──▶ REJECTED (terminal)
//! ```
//!
//! Status never regresses. `processed_at` is stamped once, on the first
//! transition out of `UNDER_REVIEW`.
//!
//! An application may back at most one issued document. Issuance is allowed
//! from `UNDER_REVIEW` (approval happens as part of issuance) and from
//! `VERIFIED_AND_APPROVED` while no document is linked.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use muni_core::error::require_text;
use muni_core::{
    ApplicationId, CitizenId, DocumentCategory, DocumentId, Timestamp, ValidationError,
};

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 255;

// ─── Status ──────────────────────────────────────────────────────────

/// The review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// Submitted, awaiting a decision.
    UnderReview,
    /// Approved; a document may be issued.
    VerifiedAndApproved,
    /// Rejected (terminal).
    Rejected,
}

impl ApplicationStatus {
    /// Canonical upper-case name, as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderReview => "UNDER_REVIEW",
            Self::VerifiedAndApproved => "VERIFIED_AND_APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parse a canonical name.
    pub fn parse(s: &str) -> Result<Self, ApplicationError> {
        match s.trim() {
            "UNDER_REVIEW" => Ok(Self::UnderReview),
            "VERIFIED_AND_APPROVED" => Ok(Self::VerifiedAndApproved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(ApplicationError::UnknownStatus(other.to_string())),
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::UnderReview, Self::VerifiedAndApproved) | (Self::UnderReview, Self::Rejected)
        )
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from application lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// Attempted transition is not allowed from the current status.
    #[error("invalid application transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: ApplicationStatus,
        /// Attempted target status.
        to: ApplicationStatus,
    },

    /// A document was already issued for this application.
    #[error("application already has issued document {0}")]
    AlreadyIssued(DocumentId),

    /// The application was rejected and cannot back a document.
    #[error("application is {0}; no document can be issued")]
    NotIssuable(ApplicationStatus),

    /// Stored status text is not a known status.
    #[error("unknown application status: {0:?}")]
    UnknownStatus(String),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// ─── Application ─────────────────────────────────────────────────────

/// A citizen's request for an official document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    /// The requesting citizen, who is also the document recipient.
    pub requester: CitizenId,
    pub title: String,
    pub category: DocumentCategory,
    pub status: ApplicationStatus,
    pub submitted_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    /// The document issued from this application, once issued.
    pub document_id: Option<DocumentId>,
}

impl Application {
    /// Create a new application in `UNDER_REVIEW`. The title is trimmed.
    pub fn submit(
        id: ApplicationId,
        requester: CitizenId,
        title: &str,
        category: DocumentCategory,
        now: Timestamp,
    ) -> Result<Self, ApplicationError> {
        Ok(Self {
            id,
            requester,
            title: require_text("title", title, MAX_TITLE_LEN)?,
            category,
            status: ApplicationStatus::UnderReview,
            submitted_at: now,
            processed_at: None,
            document_id: None,
        })
    }

    /// `UNDER_REVIEW → VERIFIED_AND_APPROVED`.
    pub fn approve(&mut self, now: Timestamp) -> Result<(), ApplicationError> {
        self.transition(ApplicationStatus::VerifiedAndApproved, now)
    }

    /// `UNDER_REVIEW → REJECTED`.
    pub fn reject(&mut self, now: Timestamp) -> Result<(), ApplicationError> {
        self.transition(ApplicationStatus::Rejected, now)
    }

    /// Check that a document may be issued from this application now.
    pub fn check_issuable(&self) -> Result<(), ApplicationError> {
        if let Some(document_id) = self.document_id {
            return Err(ApplicationError::AlreadyIssued(document_id));
        }
        match self.status {
            ApplicationStatus::UnderReview | ApplicationStatus::VerifiedAndApproved => Ok(()),
            ApplicationStatus::Rejected => Err(ApplicationError::NotIssuable(self.status)),
        }
    }

    /// Link an issued document, approving the application first if it is
    /// still under review. Nothing changes on error.
    pub fn record_issuance(
        &mut self,
        document_id: DocumentId,
        now: Timestamp,
    ) -> Result<(), ApplicationError> {
        self.check_issuable()?;
        if self.status == ApplicationStatus::UnderReview {
            self.approve(now)?;
        }
        self.document_id = Some(document_id);
        Ok(())
    }

    fn transition(&mut self, to: ApplicationStatus, now: Timestamp) -> Result<(), ApplicationError> {
        if !self.status.can_transition_to(to) {
            return Err(ApplicationError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        if self.processed_at.is_none() {
            self.processed_at = Some(now);
        }
        Ok(())
    }
}
