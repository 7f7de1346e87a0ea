//! # Certificate Subcommand
//!
//! Renders the certificate PDF for a document exported as JSON (the shape
//! returned by the documents API). The stored hash is checked against the
//! bound fields before anything is written.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use muni_core::Timestamp;
use muni_docs::{CertificateRenderer, Document};
use muni_state::Citizen;

use crate::parse_prefix;

/// Arguments for the `muni certificate` subcommand.
#[derive(Args, Debug)]
pub struct CertificateArgs {
    /// Path to the document JSON file.
    #[arg(long, value_name = "FILE")]
    pub document: PathBuf,
    /// Recipient full name as printed on the certificate.
    #[arg(long)]
    pub name: String,
    /// Recipient email as printed on the certificate.
    #[arg(long)]
    pub email: String,
    /// Verification URL prefix embedded in the QR code.
    #[arg(long)]
    pub prefix: String,
    /// Output PDF path.
    #[arg(long, value_name = "OUT")]
    pub out: PathBuf,
}

/// Execute the certificate subcommand.
pub fn run_certificate(args: &CertificateArgs) -> Result<u8> {
    let document = load_document(&args.document)?;

    let recomputed = document.recompute_hash()?;
    if recomputed != document.document_hash {
        bail!(
            "document {} hash does not match its fields (stored {}, computed {recomputed})",
            document.id,
            document.document_hash
        );
    }

    let recipient = Citizen::register(document.issued_to, &args.name, &args.email, Timestamp::now())
        .context("invalid recipient")?;
    let renderer = CertificateRenderer::new(parse_prefix(&args.prefix)?);
    let certificate = renderer.render(&document, &recipient)?;

    std::fs::write(&args.out, &certificate.bytes)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(document_id = %document.id, out = %args.out.display(), "certificate written");
    println!("OK: wrote {} ({} bytes)", args.out.display(), certificate.bytes.len());
    println!("{}", certificate.verification_url);
    Ok(0)
}

fn load_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse document JSON: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use muni_core::{ApplicationId, CitizenId, DocumentCategory, DocumentId};
    use muni_docs::HashBinding;

    fn document() -> Document {
        let issued_at = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let issued_to = CitizenId::new(7).unwrap();
        let document_hash = HashBinding {
            title: "Birth Certificate",
            issued_to,
            category: DocumentCategory::Birth,
            issued_at,
        }
        .document_hash()
        .unwrap();
        Document {
            id: DocumentId::new(42).unwrap(),
            application_id: ApplicationId::new(42).unwrap(),
            title: "Birth Certificate".to_string(),
            issued_to,
            category: DocumentCategory::Birth,
            document_hash,
            issued_at,
        }
    }

    fn args(dir: &Path, document: &Document) -> CertificateArgs {
        let path = dir.join("document.json");
        std::fs::write(&path, serde_json::to_string(document).unwrap()).unwrap();
        CertificateArgs {
            document: path,
            name: "Asha Rao".to_string(),
            email: "asha@example.org".to_string(),
            prefix: "https://muni.example/verify".to_string(),
            out: dir.join("Document-42.pdf"),
        }
    }

    #[test]
    fn writes_pdf_for_consistent_document() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), &document());

        assert_eq!(run_certificate(&args).unwrap(), 0);
        let bytes = std::fs::read(&args.out).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn refuses_tampered_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut tampered = document();
        tampered.title = "Death Certificate".to_string();
        let args = args(dir.path(), &tampered);

        let err = run_certificate(&args).unwrap_err();
        assert!(err.to_string().contains("does not match"), "{err}");
        assert!(!args.out.exists());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), &document());
        args.document = dir.path().join("absent.json");
        let err = run_certificate(&args).unwrap_err();
        assert!(err.to_string().contains("failed to read"), "{err}");
    }
}
