//! # Document Issuance API
//!
//! Administrator-only issuance and listing, and certificate download for
//! administrators and the owning citizen.
//!
//! Issuance order: commit in the ledger, write through to Postgres, render
//! the certificate, hand the notice to the mailer task, respond. A failed
//! Postgres write reverts the ledger commit before the 500 goes out. The mail
//! leg never changes the response.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use muni_core::{ApplicationId, DocumentId, Timestamp};
use muni_docs::{Certificate, DeliveryNotice, Document, DocumentIssuer, Ledger};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::notify;
use crate::state::AppState;

pub const ISSUED_MESSAGE: &str = "Document successfully issued and queued for email delivery.";

/// An issued document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: i64,
    pub application_id: i64,
    pub title: String,
    pub issued_to: i64,
    /// Document category, e.g. `BIRTH`.
    pub category: String,
    pub document_hash: String,
    #[schema(value_type = String, format = DateTime)]
    pub issued_at: Timestamp,
}

impl From<&Document> for DocumentView {
    fn from(d: &Document) -> Self {
        Self {
            id: d.id.get(),
            application_id: d.application_id.get(),
            title: d.title.clone(),
            issued_to: d.issued_to.get(),
            category: d.category.as_str().to_string(),
            document_hash: d.document_hash.clone(),
            issued_at: d.issued_at,
        }
    }
}

/// An issued document with its recipient's contact details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedDocumentView {
    #[serde(flatten)]
    pub document: DocumentView,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
}

/// Response to a successful issuance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueResponse {
    pub message: String,
    pub document: DocumentView,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/documents", get(list_documents))
        .route("/v1/documents/issue/{application_id}", post(issue_document))
        .route("/v1/documents/{id}/certificate", get(download_certificate))
}

/// POST /v1/documents/issue/{application_id}
#[utoipa::path(
    post,
    path = "/v1/documents/issue/{application_id}",
    params(("application_id" = i64, Path, description = "Application to issue from")),
    responses(
        (status = 200, description = "Document issued", body = IssueResponse),
        (status = 400, description = "Malformed id", body = crate::error::ErrorBody),
        (status = 404, description = "Application not found", body = crate::error::ErrorBody),
        (status = 409, description = "Rejected or already issued", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
pub(crate) async fn issue_document(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
) -> Result<Json<IssueResponse>, AppError> {
    require_role(&caller, Role::Administrator)?;
    let application_id =
        ApplicationId::parse(&raw_id).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let issuer = DocumentIssuer::new(state.ledger.as_ref(), state.renderer.as_ref());
    let committed = issuer.commit(application_id, Timestamp::now())?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) =
            crate::db::documents::insert_issuance(pool, &committed.application, &committed.document)
                .await
        {
            tracing::error!(
                application_id = %application_id,
                document_id = %committed.document.id,
                error = %e,
                "failed to persist issuance to database"
            );
            if !issuer.revert(&committed) {
                tracing::error!(document_id = %committed.document.id, "issuance could not be reverted in-memory");
            }
            return Err(AppError::Internal(
                "database persist failed; document not issued".to_string(),
            ));
        }
    }
    metrics::counter!("muni_documents_issued_total").increment(1);

    let certificate = issuer.render(&committed.document, &committed.recipient)?;
    notify::dispatch(
        state.mailer.clone(),
        DeliveryNotice::for_issuance(&committed.document, &committed.recipient, &certificate),
    );

    Ok(Json(IssueResponse {
        message: ISSUED_MESSAGE.to_string(),
        document: DocumentView::from(&committed.document),
    }))
}

/// GET /v1/documents
#[utoipa::path(
    get,
    path = "/v1/documents",
    responses(
        (status = 200, description = "All issued documents", body = Vec<IssuedDocumentView>),
        (status = 403, description = "Administrator role required", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
pub(crate) async fn list_documents(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<IssuedDocumentView>>, AppError> {
    require_role(&caller, Role::Administrator)?;

    let ledger = state.ledger.as_ref();
    let documents = ledger
        .documents()
        .iter()
        .map(|document| {
            let recipient = ledger.citizen(document.issued_to);
            IssuedDocumentView {
                document: DocumentView::from(document),
                recipient_name: recipient.as_ref().map(|c| c.full_name.clone()),
                recipient_email: recipient.map(|c| c.email.to_string()),
            }
        })
        .collect();

    Ok(Json(documents))
}

/// GET /v1/documents/{id}/certificate
#[utoipa::path(
    get,
    path = "/v1/documents/{id}/certificate",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Certificate PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
pub(crate) async fn download_certificate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("document {raw_id} not found"));
    let id = DocumentId::parse(&raw_id).map_err(|_| not_found())?;
    let document = state.ledger.document(id).ok_or_else(not_found)?;

    match caller.role {
        Role::Administrator => {}
        // Another citizen's document looks absent rather than forbidden.
        Role::Citizen if !caller.is_citizen(document.issued_to) => return Err(not_found()),
        Role::Citizen => {}
        Role::Clerk => require_role(&caller, Role::Administrator)?,
    }

    let (document, _, certificate) =
        DocumentIssuer::new(state.ledger.as_ref(), state.renderer.as_ref()).certificate(id)?;

    Ok((
        [
            (header::CONTENT_TYPE, Certificate::CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", Certificate::file_name(&document)),
            ),
        ],
        certificate.bytes,
    )
        .into_response())
}
