//! # Document Categories
//!
//! The closed set of municipal document categories an application may
//! request. Text input is parsed through [`DocumentCategory::parse`], which
//! returns a `Result`; callers check the outcome before use.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A municipal document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentCategory {
    Birth,
    Death,
    Marriage,
    Residence,
    Income,
    Caste,
    PropertyTax,
    TradeLicense,
    BuildingPermit,
    NoObjection,
}

impl DocumentCategory {
    /// Every category, in declaration order.
    pub const ALL: [DocumentCategory; 10] = [
        Self::Birth,
        Self::Death,
        Self::Marriage,
        Self::Residence,
        Self::Income,
        Self::Caste,
        Self::PropertyTax,
        Self::TradeLicense,
        Self::BuildingPermit,
        Self::NoObjection,
    ];

    /// The canonical upper-case name. This string is bound into document
    /// hashes and must never change for an existing variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Birth => "BIRTH",
            Self::Death => "DEATH",
            Self::Marriage => "MARRIAGE",
            Self::Residence => "RESIDENCE",
            Self::Income => "INCOME",
            Self::Caste => "CASTE",
            Self::PropertyTax => "PROPERTY_TAX",
            Self::TradeLicense => "TRADE_LICENSE",
            Self::BuildingPermit => "BUILDING_PERMIT",
            Self::NoObjection => "NO_OBJECTION",
        }
    }

    /// Parse a canonical name. Surrounding whitespace is ignored; matching
    /// is case-sensitive.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let name = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_variant() {
        for c in DocumentCategory::ALL {
            assert_eq!(DocumentCategory::parse(c.as_str()).unwrap(), c);
        }
    }

    #[test]
    fn parse_trims_but_is_case_sensitive() {
        assert_eq!(DocumentCategory::parse(" BIRTH\n").unwrap(), DocumentCategory::Birth);
        assert_eq!(
            DocumentCategory::parse("birth"),
            Err(ValidationError::UnknownCategory("birth".to_string()))
        );
    }

    #[test]
    fn unknown_category_is_an_error_value() {
        assert!(matches!(
            "PASSPORT".parse::<DocumentCategory>(),
            Err(ValidationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn serde_matches_as_str() {
        for c in DocumentCategory::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.as_str()));
        }
    }
}
