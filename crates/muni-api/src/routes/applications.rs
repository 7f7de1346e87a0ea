//! # Application API
//!
//! Citizens file document requests for themselves; clerks may file on a
//! citizen's behalf and read every application. Review decisions are
//! administrator-only.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use muni_core::{ApplicationId, CitizenId, DocumentCategory, Timestamp};
use muni_docs::ApplicationRegistry;
use muni_state::Application;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request for an official document.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    /// Required for clerks. Citizens may omit it or must pass their own id.
    pub requester_id: Option<i64>,
    pub title: String,
    /// One of `BIRTH`, `DEATH`, `MARRIAGE`, `RESIDENCE`, `INCOME`, `CASTE`,
    /// `PROPERTY_TAX`, `TRADE_LICENSE`, `BUILDING_PERMIT`, `NO_OBJECTION`.
    pub category: String,
}

impl Validate for SubmitApplicationRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        Ok(())
    }
}

/// A document application.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: i64,
    pub requester_id: i64,
    pub title: String,
    pub category: String,
    /// `UNDER_REVIEW`, `VERIFIED_AND_APPROVED` or `REJECTED`.
    pub status: String,
    #[schema(value_type = String, format = DateTime)]
    pub submitted_at: Timestamp,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub processed_at: Option<Timestamp>,
    pub document_id: Option<i64>,
}

impl From<&Application> for ApplicationView {
    fn from(a: &Application) -> Self {
        Self {
            id: a.id.get(),
            requester_id: a.requester.get(),
            title: a.title.clone(),
            category: a.category.as_str().to_string(),
            status: a.status.as_str().to_string(),
            submitted_at: a.submitted_at,
            processed_at: a.processed_at,
            document_id: a.document_id.map(|d| d.get()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/applications", post(submit_application).get(list_applications))
        .route("/v1/applications/{id}", get(get_application))
        .route("/v1/applications/{id}/approve", post(approve_application))
        .route("/v1/applications/{id}/reject", post(reject_application))
}

/// Resolve whose application this is from the caller and the request.
fn resolve_requester(caller: &CallerIdentity, requested: Option<i64>) -> Result<CitizenId, AppError> {
    let requested = requested
        .map(|raw| CitizenId::new(raw).ok_or_else(|| AppError::Validation(format!("invalid requesterId {raw}"))))
        .transpose()?;

    match (caller.role, caller.citizen_id, requested) {
        (Role::Citizen, Some(own), None) => Ok(own),
        (Role::Citizen, Some(own), Some(other)) if own == other => Ok(own),
        (Role::Citizen, _, _) => Err(AppError::Forbidden(
            "citizens may only file applications for themselves".to_string(),
        )),
        (_, _, Some(requester)) => Ok(requester),
        (_, _, None) => Err(AppError::Validation("requesterId is required".to_string())),
    }
}

fn parse_application_id(raw: &str) -> Result<ApplicationId, AppError> {
    ApplicationId::parse(raw).map_err(|_| AppError::NotFound(format!("application {raw} not found")))
}

/// POST /v1/applications
#[utoipa::path(
    post,
    path = "/v1/applications",
    request_body = SubmitApplicationRequest,
    responses(
        (status = 201, description = "Application filed", body = ApplicationView),
        (status = 400, description = "Unknown category", body = crate::error::ErrorBody),
        (status = 404, description = "Requester not found", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid title", body = crate::error::ErrorBody),
    ),
    tag = "applications"
)]
pub(crate) async fn submit_application(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<SubmitApplicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApplicationView>), AppError> {
    let req = extract_validated_json(body)?;
    let requester = resolve_requester(&caller, req.requester_id)?;
    let category =
        DocumentCategory::parse(&req.category).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let registry = ApplicationRegistry::new(state.ledger.as_ref());
    let application = registry.request(requester, &req.title, category, Timestamp::now())?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::applications::insert(pool, &application).await {
            tracing::error!(application_id = %application.id, error = %e, "failed to persist application to database");
            registry.undo_request(&application);
            return Err(AppError::Internal(
                "database persist failed; application not recorded".to_string(),
            ));
        }
    }

    Ok((StatusCode::CREATED, Json(ApplicationView::from(&application))))
}

/// GET /v1/applications
#[utoipa::path(
    get,
    path = "/v1/applications",
    responses(
        (status = 200, description = "Applications visible to the caller", body = Vec<ApplicationView>),
    ),
    tag = "applications"
)]
pub(crate) async fn list_applications(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<ApplicationView>>, AppError> {
    let registry = ApplicationRegistry::new(state.ledger.as_ref());
    let applications = if caller.has_role(Role::Clerk) {
        registry.list()
    } else {
        match caller.citizen_id {
            Some(own) => registry.list_for(own),
            None => Vec::new(),
        }
    };
    Ok(Json(applications.iter().map(ApplicationView::from).collect()))
}

/// GET /v1/applications/{id}
#[utoipa::path(
    get,
    path = "/v1/applications/{id}",
    params(("id" = i64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application found", body = ApplicationView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "applications"
)]
pub(crate) async fn get_application(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
) -> Result<Json<ApplicationView>, AppError> {
    let id = parse_application_id(&raw_id)?;
    let application = ApplicationRegistry::new(state.ledger.as_ref()).get(id)?;
    if !caller.can_act_for(application.requester) {
        return Err(AppError::NotFound(format!("application {id} not found")));
    }
    Ok(Json(ApplicationView::from(&application)))
}

/// POST /v1/applications/{id}/approve
#[utoipa::path(
    post,
    path = "/v1/applications/{id}/approve",
    params(("id" = i64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application approved", body = ApplicationView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already decided", body = crate::error::ErrorBody),
    ),
    tag = "applications"
)]
pub(crate) async fn approve_application(
    state: State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
) -> Result<Json<ApplicationView>, AppError> {
    decide(state, caller, &raw_id, true).await
}

/// POST /v1/applications/{id}/reject
#[utoipa::path(
    post,
    path = "/v1/applications/{id}/reject",
    params(("id" = i64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application rejected", body = ApplicationView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already decided", body = crate::error::ErrorBody),
    ),
    tag = "applications"
)]
pub(crate) async fn reject_application(
    state: State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
) -> Result<Json<ApplicationView>, AppError> {
    decide(state, caller, &raw_id, false).await
}

async fn decide(
    State(state): State<AppState>,
    caller: CallerIdentity,
    raw_id: &str,
    approve: bool,
) -> Result<Json<ApplicationView>, AppError> {
    require_role(&caller, Role::Administrator)?;
    let id = parse_application_id(raw_id)?;

    let registry = ApplicationRegistry::new(state.ledger.as_ref());
    let application = if approve {
        registry.approve(id, Timestamp::now())?
    } else {
        registry.reject(id, Timestamp::now())?
    };

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::applications::update_decision(pool, &application).await {
            tracing::error!(application_id = %id, error = %e, "failed to persist decision to database");
            registry.undo_decision(&application);
            return Err(AppError::Internal(
                "database persist failed; decision not recorded".to_string(),
            ));
        }
    }

    Ok(Json(ApplicationView::from(&application)))
}
