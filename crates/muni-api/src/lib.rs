//! # muni-api: Document Issuance Service
//!
//! Axum service over the muni-docs pipeline.
//!
//! ## API Surface
//!
//! | Prefix                        | Module                     | Access                 |
//! |-------------------------------|----------------------------|------------------------|
//! | `/v1/documents/verify/*`      | [`routes::verify`]         | public                 |
//! | `/v1/documents/*`             | [`routes::documents`]      | administrator, owner   |
//! | `/v1/applications/*`          | [`routes::applications`]   | citizen (own), clerk+  |
//! | `/v1/citizens/*`              | [`routes::citizens`]       | clerk+, self           |
//! | `/health/*`, `/metrics`, `/openapi.json` | this module     | public                 |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler          (authenticated routes)
//! TraceLayer → CorsLayer → Handler               (verification)
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod notify;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::error::AppError;
pub use crate::state::{AppConfig, AppState};

/// Assemble the full application router.
///
/// Health probes, metrics, the OpenAPI document and the verification route
/// are mounted outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::citizens::router())
        .merge(routes::applications::router())
        .merge(routes::documents::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    // Scanners run in browsers on arbitrary origins.
    let verification = routes::verify::router()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
        .with_state(state.clone());

    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(render_metrics))
        .merge(openapi::router())
        .with_state(state);

    Router::new()
        .merge(public)
        .merge(verification)
        .merge(api)
        .layer(TraceLayer::new_for_http())
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the database, if configured, answers.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness check: database unreachable");
            return Err(AppError::ServiceUnavailable("database unreachable".to_string()));
        }
    }
    Ok("ready")
}

/// Prometheus text exposition.
async fn render_metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    match (&state.metrics, state.config.metrics_enabled) {
        (Some(handle), true) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response()),
        _ => Err(AppError::ServiceUnavailable(
            "metrics exporter is disabled".to_string(),
        )),
    }
}
