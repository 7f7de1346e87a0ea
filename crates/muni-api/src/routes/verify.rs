//! # Public Verification
//!
//! The endpoint a scanned certificate QR code opens. Unauthenticated,
//! side-effect free apart from a counter, and total: every request gets a
//! 200 with the canned boolean answer, never an error body or the stored
//! hash.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use muni_core::DocumentId;
use muni_docs::{outcome_message, AuthenticityVerifier};

use crate::state::AppState;

/// Result of an authenticity check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub is_authentic: bool,
    pub message: String,
    /// The claimed document id, or null when it was not a valid id.
    #[schema(value_type = Option<i64>)]
    pub document_id: Option<DocumentId>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/documents/verify/{document_id}/{hash}", get(verify_document))
}

/// GET /v1/documents/verify/{document_id}/{hash}
#[utoipa::path(
    get,
    path = "/v1/documents/verify/{document_id}/{hash}",
    params(
        ("document_id" = String, Path, description = "Claimed document id"),
        ("hash" = String, Path, description = "Claimed document hash"),
    ),
    responses(
        (status = 200, description = "Verification outcome", body = VerificationResponse),
    ),
    tag = "verification"
)]
pub(crate) async fn verify_document(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Json<VerificationResponse> {
    let (document_id, claimed) = match path {
        Ok(Path((id, hash))) => (DocumentId::parse(&id).ok(), hash),
        Err(_) => (None, String::new()),
    };

    let is_authentic = AuthenticityVerifier::new(state.ledger.as_ref()).verify(document_id, &claimed);

    let outcome = if is_authentic { "authentic" } else { "rejected" };
    metrics::counter!("muni_verifications_total", "outcome" => outcome).increment(1);
    tracing::info!(document_id = ?document_id.map(DocumentId::get), outcome, "verification request");

    Json(VerificationResponse {
        is_authentic,
        message: outcome_message(is_authentic).to_string(),
        document_id,
    })
}
