//! # Citizen Record
//!
//! The requester of applications and recipient of issued documents.

use serde::{Deserialize, Serialize};

use muni_core::error::require_text;
use muni_core::{CitizenId, EmailAddress, Timestamp, ValidationError};

/// Maximum full-name length in characters.
pub const MAX_NAME_LEN: usize = 120;

/// A registered citizen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citizen {
    pub id: CitizenId,
    pub full_name: String,
    pub email: EmailAddress,
    pub created_at: Timestamp,
}

impl Citizen {
    /// Validate inputs and build a citizen record.
    pub fn register(
        id: CitizenId,
        full_name: &str,
        email: &str,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            full_name: require_text("full_name", full_name, MAX_NAME_LEN)?,
            email: EmailAddress::parse(email)?,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_trims_and_validates() {
        let c = Citizen::register(
            CitizenId::new(7).unwrap(),
            " Asha Rao ",
            "asha@example.org",
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(c.full_name, "Asha Rao");
        assert_eq!(c.email.as_str(), "asha@example.org");
    }

    #[test]
    fn register_rejects_bad_email() {
        let err = Citizen::register(CitizenId::new(1).unwrap(), "Asha", "asha", Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEmail(_)));
    }
}
