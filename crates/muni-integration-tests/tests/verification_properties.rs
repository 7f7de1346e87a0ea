//! # Verification Properties
//!
//! Properties that must hold for every issued document: the stored hash
//! verifies and nothing else does, references round-trip through the codec,
//! the hash is a pure function of the bound fields, and verification never
//! fails loudly.

use std::hint::black_box;
use std::time::{Duration, Instant};

use chrono::TimeZone;
use proptest::prelude::*;

use muni_core::{ApplicationId, CitizenId, DocumentCategory, DocumentId, Timestamp, VerificationPrefix};
use muni_docs::{
    decode_reference, encode_reference, AuthenticityVerifier, CertificateRenderer, DocumentIssuer,
    HashBinding, Ledger, MemoryLedger,
};

fn renderer() -> CertificateRenderer {
    CertificateRenderer::new(VerificationPrefix::parse("https://muni.example/verify").unwrap())
}

/// Issue one document for a fresh citizen and return the ledger and id.
fn issue(title: &str, category: DocumentCategory) -> (MemoryLedger, DocumentId) {
    let ledger = MemoryLedger::new();
    let now = Timestamp::now();
    let citizen = ledger.register_citizen("Asha Rao", "asha@example.org", now).unwrap();
    let application = ledger.submit_application(citizen.id, title, category, now).unwrap();
    let committed = DocumentIssuer::new(&ledger, &renderer())
        .commit(application.id, now)
        .unwrap();
    (ledger, committed.document.id)
}

fn category_strategy() -> impl Strategy<Value = DocumentCategory> {
    prop::sample::select(vec![
        DocumentCategory::Birth,
        DocumentCategory::Death,
        DocumentCategory::Marriage,
        DocumentCategory::Residence,
        DocumentCategory::Income,
        DocumentCategory::Caste,
        DocumentCategory::PropertyTax,
        DocumentCategory::TradeLicense,
        DocumentCategory::BuildingPermit,
        DocumentCategory::NoObjection,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn only_the_stored_hash_verifies(
        title in "[A-Za-z][A-Za-z ]{0,40}",
        category in category_strategy(),
        other in ".{0,80}",
    ) {
        let (ledger, id) = issue(&title, category);
        let stored = ledger.document(id).unwrap().document_hash;
        let verifier = AuthenticityVerifier::new(&ledger);

        prop_assert!(verifier.verify(Some(id), &stored));
        prop_assume!(other.trim() != stored);
        prop_assert!(!verifier.verify(Some(id), &other));
    }

    #[test]
    fn references_round_trip(raw_id in 1i64..=i64::MAX, hash in "[A-Za-z0-9_-]{1,64}") {
        let prefix = VerificationPrefix::parse("https://muni.example/verify").unwrap();
        let id = DocumentId::new(raw_id).unwrap();
        let url = encode_reference(&prefix, id, &hash).unwrap();
        let decoded = decode_reference(&url).unwrap();
        prop_assert_eq!(decoded.document_id, id);
        prop_assert_eq!(decoded.hash, hash);
    }

    #[test]
    fn verify_is_total(raw_id in any::<i64>(), claimed in ".{0,100}") {
        let (ledger, _) = issue("Birth Certificate", DocumentCategory::Birth);
        let verifier = AuthenticityVerifier::new(&ledger);
        // Only the outcome matters; any input must return without panicking.
        let _ = verifier.verify(DocumentId::new(raw_id), &claimed);
        prop_assert!(!verifier.verify(None, &claimed));
    }
}

#[test]
fn same_snapshot_same_instant_same_hash() {
    let at = Timestamp::from_datetime(chrono::Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap());
    let ledger = MemoryLedger::new();
    let citizen = ledger.register_citizen("Asha Rao", "asha@example.org", at).unwrap();
    let first = ledger
        .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, at)
        .unwrap();
    let second = ledger
        .submit_application(citizen.id, "Birth Certificate", DocumentCategory::Birth, at)
        .unwrap();

    let renderer = renderer();
    let issuer = DocumentIssuer::new(&ledger, &renderer);
    let a = issuer.commit(first.id, at).unwrap().document;
    let b = issuer.commit(second.id, at).unwrap().document;

    assert_ne!(a.id, b.id);
    assert_eq!(a.document_hash, b.document_hash);
}

#[test]
fn single_field_perturbations_change_the_hash() {
    let at = Timestamp::from_datetime(chrono::Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap());
    let base = HashBinding {
        title: "Birth Certificate",
        issued_to: CitizenId::new(7).unwrap(),
        category: DocumentCategory::Birth,
        issued_at: at,
    };
    let original = base.document_hash().unwrap();
    let later = Timestamp::from_datetime(*at.as_datetime() + chrono::Duration::seconds(1));

    for changed in [
        HashBinding { title: "Birth certificate", ..base },
        HashBinding { issued_to: CitizenId::new(70).unwrap(), ..base },
        HashBinding { category: DocumentCategory::Death, ..base },
        HashBinding { issued_at: later, ..base },
    ] {
        assert_ne!(changed.document_hash().unwrap(), original, "{changed:?}");
    }
}

#[test]
fn restored_ledger_keeps_verifying() {
    let (ledger, id) = issue("Residence Certificate", DocumentCategory::Residence);
    let hash = ledger.document(id).unwrap().document_hash;

    let restored = MemoryLedger::restore(ledger.citizens(), ledger.applications(), ledger.documents());
    assert!(AuthenticityVerifier::new(&restored).verify(Some(id), &hash));

    // Sequences continue after the restored rows.
    let citizen = restored
        .register_citizen("Ravi Kumar", "ravi@example.org", Timestamp::now())
        .unwrap();
    assert_eq!(citizen.id.get(), 2);
    assert!(restored.application(ApplicationId::new(1).unwrap()).is_some());
}

/// Fastest batch time for verifying `claimed` against document `id`.
fn fastest_batch(verifier: &AuthenticityVerifier<'_, MemoryLedger>, id: DocumentId, claimed: &str) -> Duration {
    const BATCHES: usize = 100;
    const PER_BATCH: usize = 500;
    (0..BATCHES)
        .map(|_| {
            let start = Instant::now();
            for _ in 0..PER_BATCH {
                black_box(verifier.verify(black_box(Some(id)), black_box(claimed)));
            }
            start.elapsed()
        })
        .min()
        .unwrap_or_default()
}

#[test]
fn verification_time_does_not_track_matching_prefix() {
    let (ledger, id) = issue("Birth Certificate", DocumentCategory::Birth);
    let stored = ledger.document(id).unwrap().document_hash;
    let verifier = AuthenticityVerifier::new(&ledger);

    let flip = |c: char| if c == '0' { '1' } else { '0' };
    let mut late: Vec<char> = stored.chars().collect();
    let last = late.len() - 1;
    late[last] = flip(late[last]);
    let late: String = late.into_iter().collect();
    let mut early: Vec<char> = stored.chars().collect();
    early[0] = flip(early[0]);
    let early: String = early.into_iter().collect();

    let _ = fastest_batch(&verifier, id, &early);
    let t_late = fastest_batch(&verifier, id, &late).as_nanos().max(1) as f64;
    let t_early = fastest_batch(&verifier, id, &early).as_nanos().max(1) as f64;

    let ratio = if t_late > t_early { t_late / t_early } else { t_early / t_late };
    assert!(
        ratio < 3.0,
        "verification time depends on mismatch position: late={t_late}ns early={t_early}ns"
    );
}
