//! # Application Registry
//!
//! Records citizens' requests for documents and the review decisions on
//! them. A thin layer over the [`Ledger`] that logs each state change.

use muni_core::{ApplicationId, CitizenId, DocumentCategory, Timestamp};
use muni_state::{Application, Citizen};

use crate::ledger::{Ledger, LedgerError};

/// Application and citizen operations over a ledger.
#[derive(Debug)]
pub struct ApplicationRegistry<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> ApplicationRegistry<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Register a citizen who can then request documents.
    pub fn register_citizen(
        &self,
        full_name: &str,
        email: &str,
        now: Timestamp,
    ) -> Result<Citizen, LedgerError> {
        let citizen = self.ledger.register_citizen(full_name, email, now)?;
        tracing::info!(citizen_id = %citizen.id, "citizen registered");
        Ok(citizen)
    }

    pub fn citizen(&self, id: CitizenId) -> Result<Citizen, LedgerError> {
        self.ledger.citizen(id).ok_or(LedgerError::CitizenNotFound(id))
    }

    /// File a request for a document. The application starts `UNDER_REVIEW`.
    pub fn request(
        &self,
        requester: CitizenId,
        title: &str,
        category: DocumentCategory,
        now: Timestamp,
    ) -> Result<Application, LedgerError> {
        let application = self.ledger.submit_application(requester, title, category, now)?;
        tracing::info!(
            application_id = %application.id,
            citizen_id = %requester,
            category = %category,
            "document requested"
        );
        Ok(application)
    }

    /// `UNDER_REVIEW → VERIFIED_AND_APPROVED`.
    pub fn approve(&self, id: ApplicationId, now: Timestamp) -> Result<Application, LedgerError> {
        let application = self.ledger.decide_application(id, true, now)?;
        tracing::info!(application_id = %id, "application approved");
        Ok(application)
    }

    /// `UNDER_REVIEW → REJECTED`.
    pub fn reject(&self, id: ApplicationId, now: Timestamp) -> Result<Application, LedgerError> {
        let application = self.ledger.decide_application(id, false, now)?;
        tracing::info!(application_id = %id, "application rejected");
        Ok(application)
    }

    /// Back out a registration whose persistence failed.
    pub fn undo_registration(&self, citizen: &Citizen) -> bool {
        let undone = self.ledger.discard_citizen(citizen);
        if undone {
            tracing::warn!(citizen_id = %citizen.id, "citizen registration reverted");
        }
        undone
    }

    /// Back out a request whose persistence failed.
    pub fn undo_request(&self, application: &Application) -> bool {
        let undone = self.ledger.discard_application(application);
        if undone {
            tracing::warn!(application_id = %application.id, "document request reverted");
        }
        undone
    }

    /// Back out an approval or rejection whose persistence failed.
    pub fn undo_decision(&self, decided: &Application) -> bool {
        let undone = self.ledger.revert_decision(decided);
        if undone {
            tracing::warn!(application_id = %decided.id, "review decision reverted");
        }
        undone
    }

    pub fn get(&self, id: ApplicationId) -> Result<Application, LedgerError> {
        self.ledger
            .application(id)
            .ok_or(LedgerError::ApplicationNotFound(id))
    }

    /// All applications, ordered by id.
    pub fn list(&self) -> Vec<Application> {
        self.ledger.applications()
    }

    /// Applications filed by one citizen, ordered by id.
    pub fn list_for(&self, requester: CitizenId) -> Vec<Application> {
        self.ledger
            .applications()
            .into_iter()
            .filter(|a| a.requester == requester)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use muni_state::ApplicationStatus;

    #[test]
    fn request_then_approve() {
        let ledger = MemoryLedger::new();
        let registry = ApplicationRegistry::new(&ledger);
        let citizen = registry
            .register_citizen("Asha Rao", "asha@example.org", Timestamp::now())
            .unwrap();
        let app = registry
            .request(citizen.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now())
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::UnderReview);

        let approved = registry.approve(app.id, Timestamp::now()).unwrap();
        assert_eq!(approved.status, ApplicationStatus::VerifiedAndApproved);
        assert_eq!(registry.get(app.id).unwrap(), approved);
    }

    #[test]
    fn list_for_filters_by_requester() {
        let ledger = MemoryLedger::new();
        let registry = ApplicationRegistry::new(&ledger);
        let asha = registry.register_citizen("Asha", "asha@example.org", Timestamp::now()).unwrap();
        let ravi = registry.register_citizen("Ravi", "ravi@example.org", Timestamp::now()).unwrap();
        registry.request(asha.id, "Birth Certificate", DocumentCategory::Birth, Timestamp::now()).unwrap();
        registry.request(ravi.id, "Income Certificate", DocumentCategory::Income, Timestamp::now()).unwrap();
        registry.request(asha.id, "Residence Certificate", DocumentCategory::Residence, Timestamp::now()).unwrap();

        let mine = registry.list_for(asha.id);
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|a| a.requester == asha.id));
        assert_eq!(registry.list().len(), 3);
    }

    #[test]
    fn missing_records_are_not_found() {
        let ledger = MemoryLedger::new();
        let registry = ApplicationRegistry::new(&ledger);
        let id = ApplicationId::new(5).unwrap();
        assert_eq!(registry.get(id), Err(LedgerError::ApplicationNotFound(id)));
        assert_eq!(registry.approve(id, Timestamp::now()), Err(LedgerError::ApplicationNotFound(id)));
        let cid = CitizenId::new(5).unwrap();
        assert_eq!(registry.citizen(cid), Err(LedgerError::CitizenNotFound(cid)));
    }
}
