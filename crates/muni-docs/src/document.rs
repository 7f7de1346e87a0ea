//! # Issued Documents and Hash Binding
//!
//! A [`Document`] is immutable once issued. Its `document_hash` is the sole
//! authenticity credential and is derived, never supplied:
//!
//! ```text
//! document_hash = hex(SHA-256(JCS([title, issued_to, category, issued_at])))
//! ```
//!
//! The four fields keep their positional order inside a JSON array. JSON
//! string quoting separates them, so `("ab", 1)` and `("a", "b1")` can never
//! produce the same input. `issued_at` is the ISO 8601 UTC form at seconds
//! precision.

use serde::{Deserialize, Serialize};

use muni_core::{
    ApplicationId, CanonicalBytes, CanonicalizationError, CitizenId, ContentDigest,
    DocumentCategory, DocumentId, Timestamp,
};
use muni_crypto::sha256_digest;

/// An issued, hash-bound official document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    /// The application this document was issued from.
    pub application_id: ApplicationId,
    pub title: String,
    pub issued_to: CitizenId,
    pub category: DocumentCategory,
    pub document_hash: String,
    pub issued_at: Timestamp,
}

/// The fields bound into a document hash, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashBinding<'a> {
    pub title: &'a str,
    pub issued_to: CitizenId,
    pub category: DocumentCategory,
    pub issued_at: Timestamp,
}

impl<'a> HashBinding<'a> {
    /// The canonical digest input: a four-element JSON array.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(&(
            self.title,
            self.issued_to.get(),
            self.category.as_str(),
            self.issued_at.to_iso8601(),
        ))
    }

    /// SHA-256 over the canonical input.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&self.canonical_bytes()?))
    }

    /// The textual document hash: 64 lowercase hex characters.
    pub fn document_hash(&self) -> Result<String, CanonicalizationError> {
        Ok(self.digest()?.to_hex())
    }
}

impl Document {
    /// The binding this document's hash was computed over.
    pub fn binding(&self) -> HashBinding<'_> {
        HashBinding {
            title: &self.title,
            issued_to: self.issued_to,
            category: self.category,
            issued_at: self.issued_at,
        }
    }

    /// Recompute the hash from the stored fields.
    pub fn recompute_hash(&self) -> Result<String, CanonicalizationError> {
        self.binding().document_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued_at() -> Timestamp {
        Timestamp::from_datetime(chrono::Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap())
    }

    fn binding(title: &str) -> HashBinding<'_> {
        HashBinding {
            title,
            issued_to: CitizenId::new(7).unwrap(),
            category: DocumentCategory::Birth,
            issued_at: issued_at(),
        }
    }

    #[test]
    fn canonical_input_is_positional_array() {
        let cb = binding("Birth Certificate").canonical_bytes().unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"["Birth Certificate",7,"BIRTH","2026-01-15T12:00:00Z"]"#
        );
    }

    #[test]
    fn hash_is_deterministic_hex() {
        let a = binding("Birth Certificate").document_hash().unwrap();
        let b = binding("Birth Certificate").document_hash().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn each_field_perturbation_changes_hash() {
        let base = binding("Birth Certificate");
        let original = base.document_hash().unwrap();

        let title = HashBinding { title: "Birth Certificatf", ..base };
        let recipient = HashBinding { issued_to: CitizenId::new(8).unwrap(), ..base };
        let category = HashBinding { category: DocumentCategory::Death, ..base };
        let later = Timestamp::from_datetime(*issued_at().as_datetime() + chrono::Duration::seconds(1));
        let time = HashBinding { issued_at: later, ..base };

        for changed in [title, recipient, category, time] {
            assert_ne!(changed.document_hash().unwrap(), original, "{changed:?}");
        }
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        // Concatenated without delimiters both would read "Permit17BIRTH...".
        let a = HashBinding { title: "Permit1", issued_to: CitizenId::new(7).unwrap(), ..binding("") };
        let b = HashBinding { title: "Permit", issued_to: CitizenId::new(17).unwrap(), ..binding("") };
        assert_ne!(a.document_hash().unwrap(), b.document_hash().unwrap());
    }

    #[test]
    fn recompute_matches_stored() {
        let hash = binding("Birth Certificate").document_hash().unwrap();
        let doc = Document {
            id: DocumentId::new(1).unwrap(),
            application_id: ApplicationId::new(42).unwrap(),
            title: "Birth Certificate".into(),
            issued_to: CitizenId::new(7).unwrap(),
            category: DocumentCategory::Birth,
            document_hash: hash.clone(),
            issued_at: issued_at(),
        };
        assert_eq!(doc.recompute_hash().unwrap(), hash);
    }
}
