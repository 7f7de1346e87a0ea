//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with role-based access control.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{citizen_id}:{secret}   role-scoped token
//! Bearer {secret}                       legacy token (treated as Administrator)
//! ```
//!
//! `citizen_id` is required for the `citizen` role and optional otherwise.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] in its extensions.
//! Handlers take it as an explicit argument; nothing reads an ambient
//! "current user".

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use muni_core::CitizenId;
use muni_crypto::constant_time_str_eq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── Role ────────────────────────────────────────────────────────────────────

/// Roles ordered by privilege: `Citizen < Clerk < Administrator`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can file applications and read their own records.
    Citizen,
    /// Can register citizens and read every application.
    Clerk,
    /// Can decide applications and issue documents.
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Clerk => "clerk",
            Self::Administrator => "administrator",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: Role,
    /// The citizen the caller acts as. Always set for [`Role::Citizen`].
    pub citizen_id: Option<CitizenId>,
}

impl CallerIdentity {
    pub fn administrator() -> Self {
        Self {
            role: Role::Administrator,
            citizen_id: None,
        }
    }

    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }

    /// Whether the caller is the citizen `id` acting for themselves.
    pub fn is_citizen(&self, id: CitizenId) -> bool {
        self.role == Role::Citizen && self.citizen_id == Some(id)
    }

    /// Clerks and administrators act for anyone; citizens only for themselves.
    pub fn can_act_for(&self, id: CitizenId) -> bool {
        self.has_role(Role::Clerk) || self.is_citizen(id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// 403 unless the caller has at least `minimum`.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Parse `{role}:{citizen_id}:{secret}` or a bare `{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.as_slice() {
        [secret] => {
            if constant_time_str_eq(secret, expected_secret) {
                Ok(CallerIdentity::administrator())
            } else {
                Err("invalid bearer token".into())
            }
        }
        [role_str, citizen_str, secret] => {
            if !constant_time_str_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }

            let role = match *role_str {
                "administrator" => Role::Administrator,
                "clerk" => Role::Clerk,
                "citizen" => Role::Citizen,
                other => return Err(format!("unknown role: {other}")),
            };

            let citizen_id = if citizen_str.is_empty() {
                None
            } else {
                Some(CitizenId::parse(citizen_str).map_err(|e| format!("invalid citizen_id: {e}"))?)
            };
            if role == Role::Citizen && citizen_id.is_none() {
                return Err("citizen tokens must carry a citizen_id".into());
            }

            Ok(CallerIdentity { role, citizen_id })
        }
        _ => Err("invalid token format, expected {role}:{citizen_id}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the bearer token and inject the caller's [`CallerIdentity`].
///
/// When `AuthConfig.token` is `None` every request runs as Administrator
/// (development mode).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(header_value) if header_value.starts_with("Bearer ") => {
                    let provided = &header_value[7..];
                    match parse_bearer_token(provided, expected) {
                        Ok(identity) => {
                            request.extensions_mut().insert(identity);
                            next.run(request).await
                        }
                        Err(msg) => {
                            tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                            unauthorized_response(&msg)
                        }
                    }
                }
                Some(_) => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request.extensions_mut().insert(CallerIdentity::administrator());
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
