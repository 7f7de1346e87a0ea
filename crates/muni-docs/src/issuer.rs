//! # Document Issuer
//!
//! Turns an application into an issued document.
//!
//! ```text
//! load application ─▶ issuable? ─▶ load recipient ─▶ hash binding
//!        ─▶ commit (status + document, one ledger write) ─▶ render certificate
//! ```
//!
//! Everything before the commit can fail without side effects. Once
//! committed the document exists and is immutable; a rendering failure after
//! that point is reported as [`IssueError::Render`] and the certificate can
//! be produced again later with [`DocumentIssuer::certificate`].
//!
//! Delivery is not part of issuance. Callers build a
//! [`DeliveryNotice`](crate::notice::DeliveryNotice) from the result and
//! hand it to the notification collaborator after the commit.

use thiserror::Error;

use muni_core::{ApplicationId, CanonicalizationError, CitizenId, DocumentId, Timestamp};
use muni_state::{Application, ApplicationError, Citizen};

use crate::certificate::{Certificate, CertificateRenderer, RenderError};
use crate::document::{Document, HashBinding};
use crate::ledger::{DocumentDraft, IssuanceRecord, Ledger, LedgerError};

/// Errors from issuing a document.
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),

    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    /// The requester on the application no longer resolves to a citizen.
    #[error("recipient citizen {0} not found")]
    RecipientNotFound(CitizenId),

    /// The application is rejected or already backs a document.
    #[error("cannot issue: {0}")]
    NotIssuable(ApplicationError),

    /// Hash binding could not be computed. Nothing was persisted.
    #[error("document hash computation failed: {0}")]
    Digest(#[from] CanonicalizationError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    /// The document is committed but its certificate could not be rendered.
    #[error("document {document_id} issued but certificate rendering failed: {source}")]
    Render {
        document_id: DocumentId,
        #[source]
        source: RenderError,
    },
}

impl From<LedgerError> for IssueError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ApplicationNotFound(id) => Self::ApplicationNotFound(id),
            LedgerError::DocumentNotFound(id) => Self::DocumentNotFound(id),
            LedgerError::CitizenNotFound(id) => Self::RecipientNotFound(id),
            LedgerError::Application(inner) => Self::NotIssuable(inner),
            other => Self::Ledger(other),
        }
    }
}

/// A committed issuance, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedIssuance {
    /// The application as it was before the commit.
    pub previous: Application,
    pub application: Application,
    pub document: Document,
    pub recipient: Citizen,
}

/// A committed and rendered issuance.
#[derive(Debug, Clone)]
pub struct Issuance {
    pub application: Application,
    pub document: Document,
    pub recipient: Citizen,
    pub certificate: Certificate,
}

/// Issues documents from applications.
pub struct DocumentIssuer<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    renderer: &'a CertificateRenderer,
}

impl<'a, L: Ledger + ?Sized> DocumentIssuer<'a, L> {
    pub fn new(ledger: &'a L, renderer: &'a CertificateRenderer) -> Self {
        Self { ledger, renderer }
    }

    /// Commit and render in one call.
    pub fn issue(&self, application_id: ApplicationId, now: Timestamp) -> Result<Issuance, IssueError> {
        let committed = self.commit(application_id, now)?;
        let certificate = self.render(&committed.document, &committed.recipient)?;
        Ok(Issuance {
            application: committed.application,
            document: committed.document,
            recipient: committed.recipient,
            certificate,
        })
    }

    /// Validate, hash and persist. `now` becomes the document's `issued_at`.
    pub fn commit(
        &self,
        application_id: ApplicationId,
        now: Timestamp,
    ) -> Result<CommittedIssuance, IssueError> {
        let application = self
            .ledger
            .application(application_id)
            .ok_or(IssueError::ApplicationNotFound(application_id))?;
        application.check_issuable().map_err(IssueError::NotIssuable)?;

        let recipient = self
            .ledger
            .citizen(application.requester)
            .ok_or(IssueError::RecipientNotFound(application.requester))?;

        let binding = HashBinding {
            title: &application.title,
            issued_to: application.requester,
            category: application.category,
            issued_at: now,
        };
        let document_hash = binding.document_hash()?;

        let record = self.ledger.commit_issuance(
            application_id,
            DocumentDraft {
                title: application.title.clone(),
                issued_to: application.requester,
                category: application.category,
                document_hash,
                issued_at: now,
            },
        )?;
        tracing::info!(
            application_id = %application_id,
            document_id = %record.document.id,
            citizen_id = %recipient.id,
            category = %record.document.category,
            "document issued"
        );

        Ok(CommittedIssuance {
            previous: record.previous,
            application: record.application,
            document: record.document,
            recipient,
        })
    }

    /// Back out a commit whose persistence failed. The document disappears
    /// and the application returns to its previous state. Returns `false`
    /// if the ledger no longer holds the committed records unchanged.
    pub fn revert(&self, committed: &CommittedIssuance) -> bool {
        let reverted = self.ledger.revert_issuance(&IssuanceRecord {
            previous: committed.previous.clone(),
            application: committed.application.clone(),
            document: committed.document.clone(),
        });
        if reverted {
            tracing::warn!(
                application_id = %committed.application.id,
                document_id = %committed.document.id,
                "document issuance reverted"
            );
        }
        reverted
    }

    /// Render the certificate for an already committed document.
    pub fn render(&self, document: &Document, recipient: &Citizen) -> Result<Certificate, IssueError> {
        self.renderer
            .render(document, recipient)
            .map_err(|source| IssueError::Render {
                document_id: document.id,
                source,
            })
    }

    /// Re-render the certificate of an issued document.
    pub fn certificate(&self, document_id: DocumentId) -> Result<(Document, Citizen, Certificate), IssueError> {
        let document = self
            .ledger
            .document(document_id)
            .ok_or(IssueError::DocumentNotFound(document_id))?;
        let recipient = self
            .ledger
            .citizen(document.issued_to)
            .ok_or(IssueError::RecipientNotFound(document.issued_to))?;
        let certificate = self.render(&document, &recipient)?;
        Ok((document, recipient, certificate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::verify::AuthenticityVerifier;
    use muni_core::{DocumentCategory, VerificationPrefix};
    use muni_state::ApplicationStatus;

    fn renderer() -> CertificateRenderer {
        CertificateRenderer::new(VerificationPrefix::parse("https://muni.example/verify").unwrap())
    }

    fn pending(ledger: &MemoryLedger) -> Application {
        let citizen = ledger
            .register_citizen("Asha Rao", "asha@example.org", Timestamp::now())
            .unwrap();
        ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap()
    }

    #[test]
    fn issue_binds_hash_and_approves() {
        let ledger = MemoryLedger::new();
        let app = pending(&ledger);
        let renderer = renderer();
        let now = Timestamp::now();

        let issuance = DocumentIssuer::new(&ledger, &renderer).issue(app.id, now).unwrap();
        let doc = &issuance.document;
        assert_eq!(doc.title, "Birth Certificate");
        assert_eq!(doc.issued_to, app.requester);
        assert_eq!(doc.issued_at, now);
        assert_eq!(doc.recompute_hash().unwrap(), doc.document_hash);
        assert_eq!(issuance.application.status, ApplicationStatus::VerifiedAndApproved);
        assert_eq!(issuance.application.document_id, Some(doc.id));
        assert_eq!(
            issuance.certificate.verification_url,
            format!("https://muni.example/verify/{}/{}", doc.id, doc.document_hash)
        );
        assert!(AuthenticityVerifier::new(&ledger).verify(Some(doc.id), &doc.document_hash));
    }

    #[test]
    fn same_snapshot_same_instant_same_hash() {
        let now = Timestamp::now();
        let hashes: Vec<String> = (0..2)
            .map(|_| {
                let ledger = MemoryLedger::new();
                let app = pending(&ledger);
                let renderer = renderer();
                DocumentIssuer::new(&ledger, &renderer)
                    .commit(app.id, now)
                    .unwrap()
                    .document
                    .document_hash
            })
            .collect();
        assert_eq!(hashes[0], hashes[1]);
    }

    #[test]
    fn unknown_application_is_not_found() {
        let ledger = MemoryLedger::new();
        let renderer = renderer();
        let id = ApplicationId::new(404).unwrap();
        assert!(matches!(
            DocumentIssuer::new(&ledger, &renderer).issue(id, Timestamp::now()),
            Err(IssueError::ApplicationNotFound(got)) if got == id
        ));
    }

    #[test]
    fn reissue_is_refused() {
        let ledger = MemoryLedger::new();
        let app = pending(&ledger);
        let renderer = renderer();
        let issuer = DocumentIssuer::new(&ledger, &renderer);
        let first = issuer.issue(app.id, Timestamp::now()).unwrap();
        assert!(matches!(
            issuer.issue(app.id, Timestamp::now()),
            Err(IssueError::NotIssuable(ApplicationError::AlreadyIssued(id))) if id == first.document.id
        ));
        assert_eq!(ledger.documents().len(), 1);
    }

    #[test]
    fn rejected_application_is_refused() {
        let ledger = MemoryLedger::new();
        let app = pending(&ledger);
        ledger.decide_application(app.id, false, Timestamp::now()).unwrap();
        let renderer = renderer();
        assert!(matches!(
            DocumentIssuer::new(&ledger, &renderer).issue(app.id, Timestamp::now()),
            Err(IssueError::NotIssuable(ApplicationError::NotIssuable(ApplicationStatus::Rejected)))
        ));
        assert!(ledger.documents().is_empty());
    }

    #[test]
    fn reverted_issuance_no_longer_verifies() {
        let ledger = MemoryLedger::new();
        let app = pending(&ledger);
        let renderer = renderer();
        let issuer = DocumentIssuer::new(&ledger, &renderer);

        let committed = issuer.commit(app.id, Timestamp::now()).unwrap();
        assert!(issuer.revert(&committed));

        let verifier = AuthenticityVerifier::new(&ledger);
        assert!(!verifier.verify(Some(committed.document.id), &committed.document.document_hash));
        assert_eq!(ledger.application(app.id).unwrap(), app);
        assert!(issuer.issue(app.id, Timestamp::now()).is_ok());
    }

    #[test]
    fn render_failure_keeps_committed_document() {
        let ledger = MemoryLedger::new();
        let app = pending(&ledger);
        let oversized = format!("https://muni.example/{}", "v".repeat(400));
        let broken = CertificateRenderer::new(VerificationPrefix::parse(&oversized).unwrap());

        let err = DocumentIssuer::new(&ledger, &broken)
            .issue(app.id, Timestamp::now())
            .unwrap_err();
        let IssueError::Render { document_id, .. } = &err else {
            panic!("expected Render error, got {err:?}");
        };
        let document_id = *document_id;
        assert!(ledger.document(document_id).is_some());

        // A renderer with a sane prefix regenerates it.
        let fixed = renderer();
        let (doc, _, cert) = DocumentIssuer::new(&ledger, &fixed).certificate(document_id).unwrap();
        assert_eq!(doc.id, document_id);
        assert!(cert.bytes.starts_with(b"%PDF"));
    }
}
