//! # muni CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use muni_cli::certificate::{run_certificate, CertificateArgs};
use muni_cli::digest::{run_digest, DigestArgs};
use muni_cli::reference::{run_reference, ReferenceArgs};

/// Smart Municipal Services document tooling.
///
/// Computes document hashes, encodes and decodes verification references,
/// and renders certificates without a running service.
#[derive(Parser, Debug)]
#[command(name = "muni", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode or decode a verification reference URL.
    Reference(ReferenceArgs),

    /// Compute the document hash for a set of document fields.
    Digest(DigestArgs),

    /// Render a certificate PDF for an issued document.
    Certificate(CertificateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Reference(args) => run_reference(&args),
        Commands::Digest(args) => run_digest(&args),
        Commands::Certificate(args) => run_certificate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
