//! # Digest Subcommand
//!
//! Recomputes a document hash from its bound fields, for checking a
//! certificate by hand.

use anyhow::{Context, Result};
use clap::Args;

use muni_core::{CitizenId, DocumentCategory, Timestamp};
use muni_docs::HashBinding;

/// Arguments for the `muni digest` subcommand.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// Document title.
    #[arg(long)]
    pub title: String,
    /// Recipient citizen id.
    #[arg(long)]
    pub issued_to: String,
    /// Document category, e.g. `BIRTH`.
    #[arg(long)]
    pub category: String,
    /// Issuance time (ISO 8601, UTC).
    #[arg(long)]
    pub issued_at: String,
    /// Also print the canonical digest input.
    #[arg(long)]
    pub show_input: bool,
}

/// Execute the digest subcommand.
pub fn run_digest(args: &DigestArgs) -> Result<u8> {
    let issued_to = CitizenId::parse(&args.issued_to)
        .with_context(|| format!("invalid --issued-to {:?}", args.issued_to))?;
    let category = DocumentCategory::parse(&args.category)?;
    let issued_at = Timestamp::parse(&args.issued_at).context("invalid --issued-at")?;

    let binding = HashBinding {
        title: &args.title,
        issued_to,
        category,
        issued_at,
    };

    if args.show_input {
        let input = binding.canonical_bytes()?;
        println!("{}", String::from_utf8_lossy(input.as_bytes()));
    }
    println!("{}", binding.document_hash()?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(title: &str, category: &str, issued_at: &str) -> DigestArgs {
        DigestArgs {
            title: title.to_string(),
            issued_to: "7".to_string(),
            category: category.to_string(),
            issued_at: issued_at.to_string(),
            show_input: false,
        }
    }

    #[test]
    fn valid_fields_succeed() {
        assert_eq!(run_digest(&args("Birth Certificate", "BIRTH", "2026-01-15T12:00:00Z")).unwrap(), 0);
    }

    #[test]
    fn unknown_category_fails() {
        let err = run_digest(&args("Birth Certificate", "birth", "2026-01-15T12:00:00Z")).unwrap_err();
        assert!(err.to_string().contains("birth"), "{err}");
    }

    #[test]
    fn unparseable_time_fails() {
        assert!(run_digest(&args("Birth Certificate", "BIRTH", "15/01/2026")).is_err());
    }

    #[test]
    fn offset_times_normalize_to_utc() {
        let utc = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let offset = Timestamp::parse("2026-01-15T17:30:00+05:30").unwrap();
        let hash = |t| {
            HashBinding {
                title: "Birth Certificate",
                issued_to: CitizenId::new(7).unwrap(),
                category: DocumentCategory::Birth,
                issued_at: t,
            }
            .document_hash()
            .unwrap()
        };
        assert_eq!(hash(utc), hash(offset));
    }
}
