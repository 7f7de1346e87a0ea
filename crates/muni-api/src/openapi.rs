//! # OpenAPI Document Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Smart Municipal Services: Document Issuance API",
        version = "0.1.0",
        description = "Issue hash-bound official documents with QR-coded certificates and verify their authenticity.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Verification
        crate::routes::verify::verify_document,
        // Documents
        crate::routes::documents::issue_document,
        crate::routes::documents::list_documents,
        crate::routes::documents::download_certificate,
        // Applications
        crate::routes::applications::submit_application,
        crate::routes::applications::list_applications,
        crate::routes::applications::get_application,
        crate::routes::applications::approve_application,
        crate::routes::applications::reject_application,
        // Citizens
        crate::routes::citizens::register_citizen,
        crate::routes::citizens::get_citizen,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::auth::Role,
        crate::routes::verify::VerificationResponse,
        crate::routes::documents::DocumentView,
        crate::routes::documents::IssuedDocumentView,
        crate::routes::documents::IssueResponse,
        crate::routes::applications::SubmitApplicationRequest,
        crate::routes::applications::ApplicationView,
        crate::routes::citizens::RegisterCitizenRequest,
        crate::routes::citizens::CitizenView,
    )),
    tags(
        (name = "verification", description = "Public document authenticity checks"),
        (name = "documents", description = "Document issuance and certificates"),
        (name = "applications", description = "Document requests and review"),
        (name = "citizens", description = "Citizen registry"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/v1/documents/verify/{document_id}/{hash}",
            "/v1/documents/issue/{application_id}",
            "/v1/documents",
            "/v1/documents/{id}/certificate",
            "/v1/applications",
            "/v1/applications/{id}",
            "/v1/applications/{id}/approve",
            "/v1/applications/{id}/reject",
            "/v1/citizens",
            "/v1/citizens/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing from OpenAPI");
        }
    }
}
