//! # Citizen API
//!
//! Clerks register citizens; a citizen may read their own record.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use muni_core::{CitizenId, Timestamp};
use muni_docs::ApplicationRegistry;
use muni_state::Citizen;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request to register a citizen.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCitizenRequest {
    pub full_name: String,
    pub email: String,
}

impl Validate for RegisterCitizenRequest {
    fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().is_empty() {
            return Err("fullName must not be empty".to_string());
        }
        if self.email.trim().is_empty() {
            return Err("email must not be empty".to_string());
        }
        Ok(())
    }
}

/// A registered citizen.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CitizenView {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
}

impl From<&Citizen> for CitizenView {
    fn from(c: &Citizen) -> Self {
        Self {
            id: c.id.get(),
            full_name: c.full_name.clone(),
            email: c.email.to_string(),
            created_at: c.created_at,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/citizens", post(register_citizen))
        .route("/v1/citizens/{id}", get(get_citizen))
}

/// POST /v1/citizens
#[utoipa::path(
    post,
    path = "/v1/citizens",
    request_body = RegisterCitizenRequest,
    responses(
        (status = 201, description = "Citizen registered", body = CitizenView),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid name or email", body = crate::error::ErrorBody),
    ),
    tag = "citizens"
)]
pub(crate) async fn register_citizen(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterCitizenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CitizenView>), AppError> {
    require_role(&caller, Role::Clerk)?;
    let req = extract_validated_json(body)?;

    let registry = ApplicationRegistry::new(state.ledger.as_ref());
    let citizen = registry.register_citizen(&req.full_name, &req.email, Timestamp::now())?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::citizens::insert(pool, &citizen).await {
            tracing::error!(citizen_id = %citizen.id, error = %e, "failed to persist citizen to database");
            registry.undo_registration(&citizen);
            return Err(AppError::Internal(
                "database persist failed; citizen not registered".to_string(),
            ));
        }
    }

    Ok((StatusCode::CREATED, Json(CitizenView::from(&citizen))))
}

/// GET /v1/citizens/{id}
#[utoipa::path(
    get,
    path = "/v1/citizens/{id}",
    params(("id" = i64, Path, description = "Citizen id")),
    responses(
        (status = 200, description = "Citizen found", body = CitizenView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "citizens"
)]
pub(crate) async fn get_citizen(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(raw_id): Path<String>,
) -> Result<Json<CitizenView>, AppError> {
    let not_found = || AppError::NotFound(format!("citizen {raw_id} not found"));
    let id = CitizenId::parse(&raw_id).map_err(|_| not_found())?;
    if !caller.can_act_for(id) {
        return Err(not_found());
    }

    let citizen = ApplicationRegistry::new(state.ledger.as_ref()).citizen(id)?;
    Ok(Json(CitizenView::from(&citizen)))
}
