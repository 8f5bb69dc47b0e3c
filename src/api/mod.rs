//! Minimal HTTP surface over the assessment core.
//!
//! Exposes the core operations (score report, publish validation, workbook
//! export/import/submit) plus a health check. Authentication happens
//! upstream; the gateway forwards the caller's identity in `x-user-id` /
//! `x-superuser` headers, which become the [`crate::authz::Actor`] every
//! permission check runs against.

mod assessment_routes;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::authz::Actor;
use crate::error::ElinorError;
use crate::ingest::IngestErrors;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(assessment_routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any)),
        )
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Resolve the acting user from gateway-forwarded identity headers.
pub(crate) fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uuid>().ok())
        .ok_or(ApiError::Unauthenticated)?;
    let is_superuser = headers
        .get("x-superuser")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    Ok(Actor {
        id,
        is_authenticated: true,
        is_superuser,
    })
}

/// Error surface for the HTTP layer.
pub enum ApiError {
    Unauthenticated,
    Domain(ElinorError),
    /// Accumulated ingest problems, reported whole as a 400 payload.
    Ingest(IngestErrors),
}

impl From<ElinorError> for ApiError {
    fn from(err: ElinorError) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "authentication required" })),
            )
                .into_response(),
            ApiError::Ingest(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!(errors))).into_response()
            }
            ApiError::Domain(err) => match err {
                ElinorError::Validation(errors) => {
                    (StatusCode::BAD_REQUEST, Json(json!(errors))).into_response()
                }
                ElinorError::NotCollaborator { .. } => (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "detail": err.to_string() })),
                )
                    .into_response(),
                ElinorError::Denied(reason) => (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "detail": reason })),
                )
                    .into_response(),
                ElinorError::NotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "detail": err.to_string() })),
                )
                    .into_response(),
                other => {
                    error!(error = %other, "internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "detail": "internal server error" })),
                    )
                        .into_response()
                }
            },
        }
    }
}
