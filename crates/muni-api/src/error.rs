//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from muni-core, muni-state and muni-docs to HTTP
//! status codes with a JSON body of error code, message and details.
//! Internal error details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use muni_core::ValidationError;
use muni_docs::{IssueError, LedgerError};
use muni_state::ApplicationError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Logged, never returned to the client.
    #[error("internal error: {0}")]
    Internal(String),

    /// An optional collaborator is not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ApplicationError> for AppError {
    fn from(err: ApplicationError) -> Self {
        match &err {
            ApplicationError::InvalidTransition { .. }
            | ApplicationError::AlreadyIssued(_)
            | ApplicationError::NotIssuable(_) => Self::Conflict(err.to_string()),
            ApplicationError::Validation(_) => Self::Validation(err.to_string()),
            ApplicationError::UnknownStatus(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::CitizenNotFound(_)
            | LedgerError::ApplicationNotFound(_)
            | LedgerError::DocumentNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::EmailTaken(_) => Self::Conflict(err.to_string()),
            LedgerError::Application(inner) => inner.into(),
            LedgerError::Validation(inner) => inner.into(),
        }
    }
}

impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::ApplicationNotFound(_) | IssueError::DocumentNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            IssueError::NotIssuable(inner) => inner.into(),
            IssueError::Ledger(inner) => inner.into(),
            // A dangling requester is a data fault, not a client mistake.
            IssueError::RecipientNotFound(_) | IssueError::Digest(_) | IssueError::Render { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use muni_core::{ApplicationId, CitizenId, DocumentId};
    use muni_state::ApplicationStatus;

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            (
                AppError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[test]
    fn ledger_errors_map_to_http_semantics() {
        let app = ApplicationId::new(4).unwrap();
        assert!(matches!(
            AppError::from(LedgerError::ApplicationNotFound(app)),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::EmailTaken("a@b.c".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::Application(ApplicationError::InvalidTransition {
                from: ApplicationStatus::Rejected,
                to: ApplicationStatus::VerifiedAndApproved,
            })),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::Validation(ValidationError::Empty { field: "title" })),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn issue_errors_map_to_http_semantics() {
        let app = ApplicationId::new(42).unwrap();
        assert!(matches!(
            AppError::from(IssueError::ApplicationNotFound(app)),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(IssueError::NotIssuable(ApplicationError::AlreadyIssued(
                DocumentId::new(1).unwrap()
            ))),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(IssueError::RecipientNotFound(CitizenId::new(7).unwrap())),
            AppError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = AppError::Internal("pdf writer exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn client_error_carries_message() {
        let response = AppError::Conflict("application already has issued document 3".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert!(body.error.message.contains("document 3"));
    }
}
