//! # Reference Subcommand
//!
//! Encodes `(document id, hash)` under a prefix and decodes scanned URLs
//! back into the pair.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use muni_core::DocumentId;
use muni_docs::{encode_reference, VerificationReference};

use crate::parse_prefix;

/// Arguments for the `muni reference` subcommand.
#[derive(Args, Debug)]
pub struct ReferenceArgs {
    #[command(subcommand)]
    pub command: ReferenceCommand,
}

/// Reference subcommands.
#[derive(Subcommand, Debug)]
pub enum ReferenceCommand {
    /// Print the verification URL for a document.
    Encode {
        /// Verification URL prefix, e.g. `https://muni.example/verify`.
        #[arg(long)]
        prefix: String,
        /// Document id.
        #[arg(long)]
        id: String,
        /// Document hash.
        #[arg(long)]
        hash: String,
    },

    /// Decode a verification URL or `{id}/{hash}` path and print it as JSON.
    Decode {
        /// The scanned URL or bare path.
        #[arg(value_name = "URL")]
        url: String,
        /// Require the URL to sit directly under this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },
}

/// Execute the reference subcommand.
pub fn run_reference(args: &ReferenceArgs) -> Result<u8> {
    match &args.command {
        ReferenceCommand::Encode { prefix, id, hash } => {
            println!("{}", encode(prefix, id, hash)?);
            Ok(0)
        }
        ReferenceCommand::Decode { url, prefix } => {
            let reference = decode(url, prefix.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&reference)?);
            Ok(0)
        }
    }
}

fn encode(prefix: &str, id: &str, hash: &str) -> Result<String> {
    let prefix = parse_prefix(prefix)?;
    let id = DocumentId::parse(id).with_context(|| format!("invalid --id {id:?}"))?;
    let url = encode_reference(&prefix, id, hash)?;
    tracing::debug!(document_id = %id, %url, "encoded verification reference");
    Ok(url)
}

fn decode(url: &str, prefix: Option<&str>) -> Result<VerificationReference> {
    let reference = match prefix {
        Some(raw) => VerificationReference::decode_under(url, &parse_prefix(raw)?)?,
        None => VerificationReference::decode(url)?,
    };
    tracing::debug!(document_id = %reference.document_id, "decoded verification reference");
    Ok(reference)
}
