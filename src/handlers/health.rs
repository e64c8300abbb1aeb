use crate::{db, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: String,
    /// `connected`, or the reason the store is unavailable
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message")),
    tag = "Health"
)]
pub async fn welcome() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to E-commerce Admin API" }))
}

/// Reports whether the database answers a ping
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                database: "connected".to_string(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    database: "unreachable".to_string(),
                }),
            )
        }
    }
}
