//! # Ledger: Persistence Seam
//!
//! The [`Ledger`] trait is the persistence collaborator for citizens,
//! applications and documents, keyed by sequential integer ids.
//!
//! [`MemoryLedger`] keeps every table behind one `parking_lot::RwLock`.
//! Writes that span tables, like [`Ledger::commit_issuance`], run under a
//! single write guard, so readers never observe an approved application
//! without its document or the other way round. The lock is never held
//! across an `.await`; all methods are synchronous.
//!
//! Each write has a matching undo (`discard_*`, `revert_*`) for callers that
//! persist elsewhere after the ledger write and must back it out when that
//! fails. An undo only applies while the record is still exactly as the
//! write left it; otherwise it changes nothing and returns `false`.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use thiserror::Error;

use muni_core::{
    ApplicationId, CitizenId, DocumentCategory, DocumentId, Timestamp, ValidationError,
};
use muni_state::{Application, ApplicationError, ApplicationStatus, Citizen};

use crate::document::Document;

/// Errors from ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("citizen {0} not found")]
    CitizenNotFound(CitizenId),

    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),

    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    /// Another citizen is registered with this email.
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// The application state forbids the requested change.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Everything needed to persist a document except its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub title: String,
    pub issued_to: CitizenId,
    pub category: DocumentCategory,
    pub document_hash: String,
    pub issued_at: Timestamp,
}

/// Result of a committed issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceRecord {
    /// The application before the commit.
    pub previous: Application,
    /// The application after linking the document.
    pub application: Application,
    pub document: Document,
}

/// Persistence collaborator for the issuance pipeline.
pub trait Ledger: Send + Sync {
    fn citizen(&self, id: CitizenId) -> Option<Citizen>;

    fn citizens(&self) -> Vec<Citizen>;

    /// Validate and store a new citizen. Emails are unique, compared
    /// case-insensitively.
    fn register_citizen(
        &self,
        full_name: &str,
        email: &str,
        now: Timestamp,
    ) -> Result<Citizen, LedgerError>;

    fn application(&self, id: ApplicationId) -> Option<Application>;

    /// All applications, ordered by id.
    fn applications(&self) -> Vec<Application>;

    /// Store a new `UNDER_REVIEW` application. The requester must exist.
    fn submit_application(
        &self,
        requester: CitizenId,
        title: &str,
        category: DocumentCategory,
        now: Timestamp,
    ) -> Result<Application, LedgerError>;

    /// Apply a status decision (`approve = true` for approval, otherwise
    /// rejection).
    fn decide_application(
        &self,
        id: ApplicationId,
        approve: bool,
        now: Timestamp,
    ) -> Result<Application, LedgerError>;

    fn document(&self, id: DocumentId) -> Option<Document>;

    /// All documents, ordered by id.
    fn documents(&self) -> Vec<Document>;

    /// Atomically re-check that the application is issuable, assign a
    /// document id, store the document and link it to the application.
    fn commit_issuance(
        &self,
        application_id: ApplicationId,
        draft: DocumentDraft,
    ) -> Result<IssuanceRecord, LedgerError>;

    /// Undo [`Ledger::register_citizen`]. Refused once the citizen has
    /// applications.
    fn discard_citizen(&self, citizen: &Citizen) -> bool;

    /// Undo [`Ledger::submit_application`]. Refused once the application
    /// has changed.
    fn discard_application(&self, application: &Application) -> bool;

    /// Undo [`Ledger::decide_application`], returning `decided` to
    /// `UNDER_REVIEW`.
    fn revert_decision(&self, decided: &Application) -> bool;

    /// Undo [`Ledger::commit_issuance`]: drop the document and restore the
    /// application to `record.previous`.
    fn revert_issuance(&self, record: &IssuanceRecord) -> bool;
}

// ─── In-memory implementation ────────────────────────────────────────

#[derive(Debug, Default)]
struct Tables {
    citizens: BTreeMap<CitizenId, Citizen>,
    applications: BTreeMap<ApplicationId, Application>,
    documents: BTreeMap<DocumentId, Document>,
    last_citizen: i64,
    last_application: i64,
    last_document: i64,
}

/// The id after `last`, or `InvalidId` once the sequence overflows.
fn next_id<T>(last: i64, wrap: fn(i64) -> Option<T>) -> Result<T, ValidationError> {
    last.checked_add(1)
        .and_then(wrap)
        .ok_or_else(|| ValidationError::InvalidId(format!("{last}+1")))
}

/// In-memory [`Ledger`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: RwLock<Tables>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from previously persisted rows. Id sequences continue after
    /// the largest restored id in each table.
    pub fn restore(
        citizens: Vec<Citizen>,
        applications: Vec<Application>,
        documents: Vec<Document>,
    ) -> Self {
        let mut tables = Tables {
            last_citizen: citizens.iter().map(|c| c.id.get()).max().unwrap_or(0),
            last_application: applications.iter().map(|a| a.id.get()).max().unwrap_or(0),
            last_document: documents.iter().map(|d| d.id.get()).max().unwrap_or(0),
            ..Tables::default()
        };
        tables.citizens = citizens.into_iter().map(|c| (c.id, c)).collect();
        tables.applications = applications.into_iter().map(|a| (a.id, a)).collect();
        tables.documents = documents.into_iter().map(|d| (d.id, d)).collect();
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Ledger for MemoryLedger {
    fn citizen(&self, id: CitizenId) -> Option<Citizen> {
        self.tables.read().citizens.get(&id).cloned()
    }

    fn citizens(&self) -> Vec<Citizen> {
        self.tables.read().citizens.values().cloned().collect()
    }

    fn register_citizen(
        &self,
        full_name: &str,
        email: &str,
        now: Timestamp,
    ) -> Result<Citizen, LedgerError> {
        let mut tables = self.tables.write();
        let id = next_id(tables.last_citizen, CitizenId::new)?;
        let citizen = Citizen::register(id, full_name, email, now)?;
        let taken = tables
            .citizens
            .values()
            .any(|c| c.email.as_str().eq_ignore_ascii_case(citizen.email.as_str()));
        if taken {
            return Err(LedgerError::EmailTaken(citizen.email.to_string()));
        }
        tables.last_citizen = id.get();
        tables.citizens.insert(citizen.id, citizen.clone());
        Ok(citizen)
    }

    fn application(&self, id: ApplicationId) -> Option<Application> {
        self.tables.read().applications.get(&id).cloned()
    }

    fn applications(&self) -> Vec<Application> {
        self.tables.read().applications.values().cloned().collect()
    }

    fn submit_application(
        &self,
        requester: CitizenId,
        title: &str,
        category: DocumentCategory,
        now: Timestamp,
    ) -> Result<Application, LedgerError> {
        let mut tables = self.tables.write();
        if !tables.citizens.contains_key(&requester) {
            return Err(LedgerError::CitizenNotFound(requester));
        }
        let id = next_id(tables.last_application, ApplicationId::new)?;
        let application = Application::submit(id, requester, title, category, now)?;
        tables.last_application = id.get();
        tables.applications.insert(id, application.clone());
        Ok(application)
    }

    fn decide_application(
        &self,
        id: ApplicationId,
        approve: bool,
        now: Timestamp,
    ) -> Result<Application, LedgerError> {
        let mut tables = self.tables.write();
        let application = tables
            .applications
            .get_mut(&id)
            .ok_or(LedgerError::ApplicationNotFound(id))?;
        let mut updated = application.clone();
        if approve {
            updated.approve(now)?;
        } else {
            updated.reject(now)?;
        }
        *application = updated.clone();
        Ok(updated)
    }

    fn document(&self, id: DocumentId) -> Option<Document> {
        self.tables.read().documents.get(&id).cloned()
    }

    fn documents(&self) -> Vec<Document> {
        self.tables.read().documents.values().cloned().collect()
    }

    fn commit_issuance(
        &self,
        application_id: ApplicationId,
        draft: DocumentDraft,
    ) -> Result<IssuanceRecord, LedgerError> {
        let mut tables = self.tables.write();
        let previous = tables
            .applications
            .get(&application_id)
            .cloned()
            .ok_or(LedgerError::ApplicationNotFound(application_id))?;
        previous.check_issuable()?;
        let mut application = previous.clone();

        let id = next_id(tables.last_document, DocumentId::new)?;
        application.record_issuance(id, draft.issued_at)?;
        let document = Document {
            id,
            application_id,
            title: draft.title,
            issued_to: draft.issued_to,
            category: draft.category,
            document_hash: draft.document_hash,
            issued_at: draft.issued_at,
        };

        tables.last_document = id.get();
        tables.documents.insert(id, document.clone());
        tables.applications.insert(application_id, application.clone());
        Ok(IssuanceRecord {
            previous,
            application,
            document,
        })
    }

    fn discard_citizen(&self, citizen: &Citizen) -> bool {
        let mut tables = self.tables.write();
        let referenced = tables.applications.values().any(|a| a.requester == citizen.id);
        if referenced || tables.citizens.get(&citizen.id) != Some(citizen) {
            return false;
        }
        tables.citizens.remove(&citizen.id);
        true
    }

    fn discard_application(&self, application: &Application) -> bool {
        let mut tables = self.tables.write();
        if tables.applications.get(&application.id) != Some(application) {
            return false;
        }
        tables.applications.remove(&application.id);
        true
    }

    fn revert_decision(&self, decided: &Application) -> bool {
        let mut tables = self.tables.write();
        let Some(stored) = tables.applications.get_mut(&decided.id) else {
            return false;
        };
        if *stored != *decided || decided.status == ApplicationStatus::UnderReview {
            return false;
        }
        stored.status = ApplicationStatus::UnderReview;
        stored.processed_at = None;
        true
    }

    fn revert_issuance(&self, record: &IssuanceRecord) -> bool {
        let mut tables = self.tables.write();
        let application_id = record.application.id;
        let document_id = record.document.id;
        if tables.applications.get(&application_id) != Some(&record.application)
            || tables.documents.get(&document_id) != Some(&record.document)
        {
            return false;
        }
        tables.documents.remove(&document_id);
        tables.applications.insert(application_id, record.previous.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryLedger, Citizen) {
        let ledger = MemoryLedger::new();
        let citizen = ledger
            .register_citizen("Asha Rao", "asha@example.org", Timestamp::now())
            .unwrap();
        (ledger, citizen)
    }

    fn draft(citizen: &Citizen) -> DocumentDraft {
        DocumentDraft {
            title: "Birth Certificate".into(),
            issued_to: citizen.id,
            category: DocumentCategory::Birth,
            document_hash: "ab".repeat(32),
            issued_at: Timestamp::now(),
        }
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let (ledger, citizen) = seeded();
        assert_eq!(citizen.id.get(), 1);
        let a = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        let b = ledger
            .submit_application(citizen.id, "Income Certificate", DocumentCategory::Income, Timestamp::now())
            .unwrap();
        assert_eq!((a.id.get(), b.id.get()), (1, 2));
        assert_eq!(ledger.applications().len(), 2);
    }

    #[test]
    fn email_uniqueness_ignores_case() {
        let (ledger, _) = seeded();
        let err = ledger
            .register_citizen("Someone Else", "ASHA@example.org", Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::EmailTaken(_)));
        assert_eq!(ledger.citizens().len(), 1);
    }

    #[test]
    fn failed_validation_does_not_consume_ids() {
        let (ledger, citizen) = seeded();
        assert!(ledger
            .submit_application(citizen.id, "  ", DocumentCategory::Birth, Timestamp::now())
            .is_err());
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        assert_eq!(app.id.get(), 1);
    }

    #[test]
    fn unknown_requester_is_not_found() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .submit_application(CitizenId::new(9).unwrap(), "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap_err();
        assert_eq!(err, LedgerError::CitizenNotFound(CitizenId::new(9).unwrap()));
    }

    #[test]
    fn decide_application_is_forward_only() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        let rejected = ledger.decide_application(app.id, false, Timestamp::now()).unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert!(matches!(
            ledger.decide_application(app.id, true, Timestamp::now()),
            Err(LedgerError::Application(ApplicationError::InvalidTransition { .. }))
        ));
        assert_eq!(ledger.application(app.id).unwrap().status, ApplicationStatus::Rejected);
    }

    #[test]
    fn commit_issuance_links_both_records() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        let record = ledger.commit_issuance(app.id, draft(&citizen)).unwrap();
        assert_eq!(record.document.id.get(), 1);
        assert_eq!(record.document.application_id, app.id);
        assert_eq!(record.application.status, ApplicationStatus::VerifiedAndApproved);
        assert_eq!(ledger.application(app.id).unwrap().document_id, Some(record.document.id));
        assert_eq!(ledger.document(record.document.id), Some(record.document));
    }

    #[test]
    fn second_commit_is_refused_without_side_effects() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        ledger.commit_issuance(app.id, draft(&citizen)).unwrap();
        let err = ledger.commit_issuance(app.id, draft(&citizen)).unwrap_err();
        assert!(matches!(err, LedgerError::Application(ApplicationError::AlreadyIssued(_))));
        assert_eq!(ledger.documents().len(), 1);
    }

    #[test]
    fn concurrent_commits_issue_exactly_once() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        let ledger = std::sync::Arc::new(ledger);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                let draft = draft(&citizen);
                std::thread::spawn(move || ledger.commit_issuance(app.id, draft).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(ledger.documents().len(), 1);
    }

    #[test]
    fn revert_issuance_restores_previous_state() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        let record = ledger.commit_issuance(app.id, draft(&citizen)).unwrap();
        assert_eq!(record.previous, app);

        assert!(ledger.revert_issuance(&record));
        assert!(ledger.documents().is_empty());
        assert_eq!(ledger.application(app.id).unwrap(), app);
        assert!(!ledger.revert_issuance(&record));

        // Issuable again after the undo.
        let again = ledger.commit_issuance(app.id, draft(&citizen)).unwrap();
        assert_eq!(again.application.document_id, Some(again.document.id));
    }

    #[test]
    fn revert_decision_returns_to_review() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        let approved = ledger.decide_application(app.id, true, Timestamp::now()).unwrap();

        assert!(ledger.revert_decision(&approved));
        assert_eq!(ledger.application(app.id).unwrap(), app);
        assert!(!ledger.revert_decision(&approved));
    }

    #[test]
    fn revert_decision_leaves_issued_application_alone() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        let approved = ledger.decide_application(app.id, true, Timestamp::now()).unwrap();
        ledger.commit_issuance(app.id, draft(&citizen)).unwrap();

        assert!(!ledger.revert_decision(&approved));
        assert_eq!(ledger.documents().len(), 1);
    }

    #[test]
    fn discards_only_untouched_records() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();

        assert!(!ledger.discard_citizen(&citizen));
        ledger.decide_application(app.id, false, Timestamp::now()).unwrap();
        assert!(!ledger.discard_application(&app));

        let other = ledger
            .submit_application(citizen.id, "Income Certificate", DocumentCategory::Income, Timestamp::now())
            .unwrap();
        assert!(ledger.discard_application(&other));
        assert!(ledger.application(other.id).is_none());

        let lone = ledger
            .register_citizen("Ravi Kumar", "ravi@example.org", Timestamp::now())
            .unwrap();
        assert!(ledger.discard_citizen(&lone));
        assert!(ledger.citizen(lone.id).is_none());
        // The email is free again.
        ledger
            .register_citizen("Ravi Kumar", "ravi@example.org", Timestamp::now())
            .unwrap();
    }

    #[test]
    fn restore_continues_sequences() {
        let (ledger, citizen) = seeded();
        let app = ledger
            .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        ledger.commit_issuance(app.id, draft(&citizen)).unwrap();

        let restored = MemoryLedger::restore(ledger.citizens(), ledger.applications(), ledger.documents());
        let next = restored
            .register_citizen("Ravi Kumar", "ravi@example.org", Timestamp::now())
            .unwrap();
        assert_eq!(next.id.get(), 2);
        assert_eq!(restored.documents().len(), 1);
    }
}
