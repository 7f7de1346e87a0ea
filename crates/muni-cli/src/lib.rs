//! # muni-cli: Offline Document Tooling
//!
//! Provides the `muni` command-line interface over the `muni-docs` pipeline.
//! Nothing here touches a database or the network.
//!
//! ## Subcommands
//!
//! - `muni reference encode|decode`: verification reference codec.
//! - `muni digest`: document hash from the four bound fields.
//! - `muni certificate`: render a certificate PDF from a document JSON file.
//!
//! ```bash
//! muni digest --title "Birth Certificate" --issued-to 7 --category BIRTH \
//!     --issued-at 2026-01-15T12:00:00Z
//! muni reference decode https://muni.example/verify/42/ab12
//! ```

pub mod certificate;
pub mod digest;
pub mod reference;

use anyhow::Result;
use muni_core::VerificationPrefix;

/// Parse a `--prefix` value.
pub(crate) fn parse_prefix(raw: &str) -> Result<VerificationPrefix> {
    VerificationPrefix::parse(raw).map_err(|e| anyhow::anyhow!("invalid --prefix: {e}"))
}
